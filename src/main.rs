//! # bluepreset
//!
//! Command-line entry point: parse arguments, open the workspace and the
//! terminal's session, run one command.

use bluepreset::cmd_args::CommandLineArgs;
use bluepreset::commands::{self, CommandContext};
use bluepreset::config;
use bluepreset::logging;
use bluepreset::variables::TerminalPrompter;
use bluepreset::workspace::{Session, Workspace};
use std::io::Write;
use std::process::ExitCode;

const DEFAULT_EDITOR: &str = "vi";

#[tokio::main]
async fn main() -> ExitCode {
    let args = CommandLineArgs::parse();
    logging::init(args.verbose());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CommandLineArgs) -> anyhow::Result<()> {
    let command = args.into_command()?;

    let workspace = Workspace::open_default();
    let terminal = Session::terminal_id_from(std::env::var("TTY").ok().as_deref());
    let session = Session::load(&config::config_root_path(), &terminal);
    tracing::debug!(
        "workspace {}, session {}",
        workspace.root().display(),
        session.file_path().display()
    );

    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string());

    let mut prompter = TerminalPrompter::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut ctx = CommandContext {
        workspace,
        session,
        prompter: &mut prompter,
        out: &mut out,
        editor,
    };
    let result = commands::execute(&command, &mut ctx).await;
    ctx.out.flush()?;
    ctx.session.save_if_changed()?;
    result
}
