use crate::commands::{
    is_special_request_key, normalize_target, parse_key_values, Command, Flags, KeyValuePair,
    Operation, ResponseDisplay,
};
use crate::error::Result;
use clap::{Args, Subcommand};
use std::ffi::OsString;

pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bluepreset", version, about, long_about = None)]
struct ClapArgs {
    #[arg(short, long, global = true, help = "log debug output to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: ClapCommand,
}

#[derive(Subcommand, Debug)]
enum ClapCommand {
    /// Create a preset (name or name/variant)
    Create { preset: String },

    /// Remove presets or variants
    #[command(alias = "remove")]
    Rm {
        #[arg(required = true)]
        presets: Vec<String>,
    },

    /// Copy a preset or variant (name, name/variant or /variant)
    #[command(alias = "cp")]
    Copy { source: String, destination: String },

    /// List presets and their variants
    #[command(alias = "ls")]
    List,

    /// Show the state of a preset (default: current)
    Status { preset: Option<String> },

    /// Select a variant of the current preset, creating it if needed
    Switch { variant: String },

    /// Write values into a preset document
    ///
    /// Targets: request, headers, query, body, variables. The request fields
    /// url, method, timeout and history can be given directly:
    /// `set api url https://example.com`
    Set {
        preset: String,
        target: String,
        #[arg(required = true)]
        values: Vec<String>,
        #[arg(long, help = "send the request after writing")]
        call: bool,
    },

    /// Show a preset, a document, a value, the history or a stored response
    Get {
        preset: String,
        target: Option<String>,
        key: Option<String>,
        #[arg(long, help = "print JSON instead of TOML")]
        raw: bool,
        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Edit a value at a prompt, or a whole document in $EDITOR
    Edit {
        preset: String,
        target: String,
        key: Option<String>,
        #[arg(long, help = "create the preset if it does not exist")]
        create: bool,
    },

    /// Send the request of a preset (default: current)
    Call {
        preset: Option<String>,
        #[arg(long, help = "ask again for stored hard variables")]
        persist: bool,
        #[arg(long, help = "print the assembled request without sending it")]
        dry_run: bool,
        #[arg(long, num_args = 0.., value_name = "NAME", help = "ask again only for these variables")]
        vars: Option<Vec<String>>,
        #[arg(long, help = "print JSON bodies as JSON")]
        raw: bool,
        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Print the preset as a curl command
    Export { preset: Option<String> },

    /// Fill a preset from a curl command; opens $EDITOR to paste one when
    /// none is given
    Import {
        preset: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "CURL")]
        curl: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
#[group(multiple = false)]
struct DisplayArgs {
    #[arg(long, help = "print only response headers")]
    headers_only: bool,
    #[arg(long, help = "print only the response body")]
    body_only: bool,
    #[arg(long, help = "print only the status line")]
    status_only: bool,
}

impl DisplayArgs {
    fn mode(&self) -> ResponseDisplay {
        if self.headers_only {
            ResponseDisplay::HeadersOnly
        } else if self.body_only {
            ResponseDisplay::BodyOnly
        } else if self.status_only {
            ResponseDisplay::StatusOnly
        } else {
            ResponseDisplay::Full
        }
    }
}

#[derive(Debug)]
pub struct CommandLineArgs {
    verbose: bool,
    command: ClapCommand,
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        Self::from_clap(ClapArgs::parse())
    }

    #[allow(dead_code)]
    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_clap(ClapArgs::parse_from(itr))
    }

    pub fn try_parse_from<I, T>(itr: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        ClapArgs::try_parse_from(itr).map(Self::from_clap)
    }

    fn from_clap(args: ClapArgs) -> Self {
        Self {
            verbose: args.verbose,
            command: args.command,
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Turn the parsed arguments into a [`Command`]. Fails only on malformed
    /// `key=value` pairs.
    pub fn into_command(self) -> Result<Command> {
        let command = match self.command {
            ClapCommand::Create { preset } => with_preset(Operation::Create, Some(preset)),
            ClapCommand::Rm { presets } => {
                let mut command = Command::new(Operation::Remove);
                command.names = presets;
                command
            }
            ClapCommand::Copy {
                source,
                destination,
            } => {
                let mut command = Command::new(Operation::Copy);
                command.names = vec![source, destination];
                command
            }
            ClapCommand::List => Command::new(Operation::List),
            ClapCommand::Status { preset } => with_preset(Operation::Status, preset),
            ClapCommand::Switch { variant } => {
                let mut command = Command::new(Operation::Switch);
                command.names = vec![variant];
                command
            }
            ClapCommand::Set {
                preset,
                target,
                values,
                call,
            } => {
                let mut command = with_preset(Operation::Set, Some(preset));
                command.flags.call = call;
                if let Some(value) = special_field_value(&target, &values) {
                    command.target = Some("request".to_string());
                    command.pairs = vec![KeyValuePair {
                        key: target.to_ascii_lowercase(),
                        value,
                    }];
                } else {
                    command.target = Some(normalize_target(&target));
                    command.pairs = parse_key_values(&values)?;
                }
                command
            }
            ClapCommand::Get {
                preset,
                target,
                key,
                raw,
                display,
            } => {
                let mut command = with_preset(Operation::Get, Some(preset));
                command.flags = Flags {
                    raw,
                    display: display.mode(),
                    ..Flags::default()
                };
                if let Some(target) = target {
                    let lowered = target.to_ascii_lowercase();
                    if lowered == "history" || lowered == "response" {
                        command.target = Some(lowered);
                        command.names = key.into_iter().collect();
                    } else {
                        address_field(&mut command, &target, key);
                    }
                }
                command
            }
            ClapCommand::Edit {
                preset,
                target,
                key,
                create,
            } => {
                let mut command = with_preset(Operation::Edit, Some(preset));
                command.flags.create = create;
                address_field(&mut command, &target, key);
                command
            }
            ClapCommand::Call {
                preset,
                persist,
                dry_run,
                vars,
                raw,
                display,
            } => {
                let mut command = with_preset(Operation::Call, preset);
                command.flags = Flags {
                    raw,
                    dry_run,
                    persist,
                    vars,
                    display: display.mode(),
                    ..Flags::default()
                };
                command
            }
            ClapCommand::Export { preset } => with_preset(Operation::Export, preset),
            ClapCommand::Import { preset, curl } => {
                let mut command = with_preset(Operation::Import, Some(preset));
                command.names = curl;
                command
            }
        };
        Ok(command)
    }
}

fn with_preset(operation: Operation, preset: Option<String>) -> Command {
    let mut command = Command::new(operation);
    command.preset = preset;
    command
}

/// `set api url https://...`: a special request field followed by a bare value
fn special_field_value(target: &str, values: &[String]) -> Option<String> {
    if !is_special_request_key(target) {
        return None;
    }
    match values {
        [value] => {
            let prefix = format!("{}=", target.to_ascii_lowercase());
            if value.to_ascii_lowercase().starts_with(&prefix) {
                None
            } else {
                Some(value.clone())
            }
        }
        _ => None,
    }
}

/// `<target> [key]`, where a special request field may stand in for both
fn address_field(command: &mut Command, target: &str, key: Option<String>) {
    if key.is_none() && is_special_request_key(target) {
        command.target = Some("request".to_string());
        command.names = vec![target.to_ascii_lowercase()];
    } else {
        command.target = Some(normalize_target(target));
        command.names = key.into_iter().collect();
    }
}
