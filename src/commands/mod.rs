//! # Command Pipeline
//!
//! A parsed [`Command`] is executed against a [`CommandContext`] holding the
//! workspace, the terminal session, a prompter and the output sink. Each
//! operation lives in its own module; this one resolves the preset a command
//! addresses and dispatches.
//!
//! Errors leave this layer as `anyhow` errors carrying the operation and the
//! preset they failed on.

mod call;
mod edit;
mod get;
mod manage;
mod render;
mod set;

#[cfg(test)]
pub(crate) mod tests_support;

use crate::error::Error;
use crate::variables::Prompter;
use crate::workspace::{DocumentKind, PresetRef, Session, Workspace};
use anyhow::{Context as _, Result};
use std::fmt;
use std::io::Write;

/// What a command does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Remove,
    List,
    Status,
    Switch,
    Set,
    Get,
    Edit,
    Call,
    Export,
    Import,
    Copy,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Remove => "rm",
            Operation::List => "list",
            Operation::Status => "status",
            Operation::Switch => "switch",
            Operation::Set => "set",
            Operation::Get => "get",
            Operation::Edit => "edit",
            Operation::Call => "call",
            Operation::Export => "export",
            Operation::Import => "import",
            Operation::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// Which part of a response `call` and `get response` print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseDisplay {
    #[default]
    Full,
    HeadersOnly,
    BodyOnly,
    StatusOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// Print JSON as JSON instead of converting it to TOML
    pub raw: bool,
    pub dry_run: bool,
    /// Re-ask hard variables even when a value is stored
    pub persist: bool,
    /// `--vars [names...]`: re-ask only these variables (empty means all)
    pub vars: Option<Vec<String>>,
    pub display: ResponseDisplay,
    /// `set ... --call`: send the request after writing
    pub call: bool,
    /// Create the preset if it does not exist
    pub create: bool,
}

/// One parsed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub operation: Operation,
    /// Preset argument as typed: `name`, `name/variant` or `/variant`
    pub preset: Option<String>,
    /// Canonical target name (see [`normalize_target`])
    pub target: Option<String>,
    pub pairs: Vec<KeyValuePair>,
    /// Positional names: keys for get/edit, presets for rm and copy, variant
    /// for switch, curl words for import
    pub names: Vec<String>,
    pub flags: Flags,
}

impl Command {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            preset: None,
            target: None,
            pairs: Vec::new(),
            names: Vec::new(),
            flags: Flags::default(),
        }
    }
}

/// Everything a command runs against
pub struct CommandContext<'a> {
    pub workspace: Workspace,
    pub session: Session,
    pub prompter: &'a mut dyn Prompter,
    pub out: &'a mut dyn Write,
    /// Editor command for whole-document edits
    pub editor: String,
}

/// Request fields that may be set without `key=value` syntax
pub const SPECIAL_REQUEST_KEYS: [&str; 4] = ["url", "method", "timeout", "history"];

pub fn is_special_request_key(key: &str) -> bool {
    SPECIAL_REQUEST_KEYS.contains(&key.to_ascii_lowercase().as_str())
}

/// Canonical target name for an alias. Unknown names are returned unchanged,
/// so normalizing twice equals normalizing once.
pub fn normalize_target(target: &str) -> String {
    let canonical = match target.to_ascii_lowercase().as_str() {
        "body" => "body",
        "headers" | "header" => "headers",
        "query" | "queries" => "query",
        "request" | "req" | "url" => "request",
        "variables" | "vars" | "var" => "variables",
        _ => target,
    };
    canonical.to_string()
}

/// Storage key for a request-document field
pub fn request_field_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "history" | "history_count" => "history_count".to_string(),
        "url" | "method" | "timeout" => key.to_ascii_lowercase(),
        _ => key.to_string(),
    }
}

/// Split `key=value` arguments. Surrounding double quotes on the value are dropped.
pub fn parse_key_values(args: &[String]) -> crate::error::Result<Vec<KeyValuePair>> {
    args.iter()
        .map(|arg| {
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| Error::InvalidKeyValue(arg.clone()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidKeyValue(arg.clone()));
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Ok(KeyValuePair {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Document kind for a canonical target, or an error naming the target
pub(crate) fn document_kind(target: &str) -> Result<DocumentKind> {
    DocumentKind::from_name(target).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown target '{}' (expected one of: request, headers, query, body, variables)",
            target
        )
    })
}

/// Run one command
pub async fn execute(command: &Command, ctx: &mut CommandContext<'_>) -> Result<()> {
    tracing::debug!("executing {:?}", command);
    let op = command.operation;

    match op {
        Operation::List => manage::list(ctx),
        Operation::Remove => manage::remove(command, ctx),
        Operation::Switch => manage::switch(command, ctx),
        Operation::Copy => manage::copy(command, ctx),
        Operation::Create => {
            let preset = resolve_preset(command, ctx)?;
            manage::create(&preset, ctx)
                .with_context(|| format!("{op} failed for preset '{preset}'"))
        }
        Operation::Status => manage::status(command, ctx),
        _ => {
            let preset = resolve_preset(command, ctx)?;
            let creates = matches!(op, Operation::Set | Operation::Import);
            let may_create = command.flags.create || (creates && preset.variant.is_none());
            prepare_preset(ctx, &preset, may_create)
                .with_context(|| format!("{op} failed for preset '{preset}'"))?;

            let name = preset.preset.as_str();
            let result = match op {
                Operation::Set => set::run(command, name, ctx).await,
                Operation::Get => get::run(command, name, ctx),
                Operation::Edit => edit::run(command, name, ctx),
                Operation::Call => call::run(command, name, ctx).await,
                Operation::Export => manage::export(name, ctx),
                Operation::Import => manage::import(command, name, ctx),
                other => Err(anyhow::anyhow!("{other} does not run against a preset")),
            };
            result.with_context(|| format!("{op} failed for preset '{preset}'"))?;

            ctx.session.set_current(name)?;
            Ok(())
        }
    }
}

fn resolve_preset(command: &Command, ctx: &CommandContext<'_>) -> Result<PresetRef> {
    Ok(ctx.session.resolve(command.preset.as_deref())?)
}

/// Make sure the preset exists (creating it when allowed) and select the
/// addressed variant
fn prepare_preset(ctx: &CommandContext<'_>, preset: &PresetRef, may_create: bool) -> Result<()> {
    let ws = &ctx.workspace;
    if !ws.preset_exists(&preset.preset) {
        if !may_create {
            return Err(match preset.variant {
                Some(_) => Error::VariantPresetMissing(preset.preset.clone()),
                None => Error::PresetNotFound(preset.preset.clone()),
            }
            .into());
        }
        ws.create_preset(&preset.preset)?;
    }
    if let Some(variant) = &preset.variant {
        ws.switch_variant(&preset.preset, variant)?;
    }
    Ok(())
}
