//! In-process harness for command tests: a throwaway workspace, a session
//! file, scripted prompt answers and captured output.

use super::{execute, CommandContext};
use crate::cmd_args::CommandLineArgs;
use crate::store::Document;
use crate::variables::ScriptedPrompter;
use crate::workspace::{DocumentKind, Session, Workspace};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TERMINAL_ID: &str = "test";

pub(crate) struct TestBench {
    dir: TempDir,
    prompter: ScriptedPrompter,
    out: Vec<u8>,
    editor: String,
}

impl TestBench {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            prompter: ScriptedPrompter::default(),
            out: Vec::new(),
            editor: "false".to_string(),
        }
    }

    /// Run one command line (without the program name), the way `main` does
    pub async fn run(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let argv = std::iter::once("bluepreset").chain(args.iter().copied());
        let command = CommandLineArgs::try_parse_from(argv)?.into_command()?;

        let mut ctx = CommandContext {
            workspace: self.workspace(),
            session: Session::load(self.dir.path(), TERMINAL_ID),
            prompter: &mut self.prompter,
            out: &mut self.out,
            editor: self.editor.clone(),
        };
        let result = execute(&command, &mut ctx).await;
        ctx.session.save_if_changed()?;
        result
    }

    /// Queue answers for upcoming prompts, replacing any left over
    pub fn answer<I, S>(&mut self, answers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompter = ScriptedPrompter::new(answers);
    }

    /// Prompt labels issued since the last `answer`
    pub fn asked(&self) -> Vec<String> {
        self.prompter.asked().to_vec()
    }

    pub fn take_output(&mut self) -> String {
        String::from_utf8(std::mem::take(&mut self.out)).unwrap()
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.dir.path().join("presets"))
    }

    pub fn document(&self, preset: &str, kind: DocumentKind) -> Document {
        self.workspace().load_document(preset, kind).unwrap()
    }

    pub fn session_current(&self) -> Option<String> {
        Session::load(self.dir.path(), TERMINAL_ID)
            .current()
            .map(str::to_string)
    }

    /// Write an executable script into the bench directory
    pub fn write_script(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    pub fn set_editor(&mut self, path: &Path) {
        self.editor = path.display().to_string();
    }
}
