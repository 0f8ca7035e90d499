//! `edit <preset> <target> [key]`
//!
//! With a key the current value is offered for editing at a prompt. Without
//! one the whole document is opened in an external editor on a scratch copy,
//! and the document is replaced only if the result parses and validates.

use super::{document_kind, request_field_key, Command, CommandContext};
use crate::request::validate_request_field;
use crate::store::{infer_value, Document, Value};
use crate::variables::store_variable_info;
use crate::workspace::DocumentKind;
use anyhow::{bail, Context as _, Result};
use std::fs;
use std::process;

pub(super) fn run(command: &Command, preset: &str, ctx: &mut CommandContext<'_>) -> Result<()> {
    let target = command
        .target
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("edit needs a target"))?;
    let kind = document_kind(target)?;

    match command.names.first() {
        Some(key) => edit_field(ctx, preset, kind, key),
        None => edit_document(ctx, preset, kind),
    }
}

fn edit_field(ctx: &mut CommandContext<'_>, preset: &str, kind: DocumentKind, key: &str) -> Result<()> {
    let key = if kind == DocumentKind::Request {
        request_field_key(key)
    } else {
        key.to_string()
    };

    let mut document = ctx.workspace.load_document(preset, kind)?;
    let current = document.get_as_string(&key);
    let answer = ctx.prompter.prompt(&key, Some(&current))?;
    if answer.is_empty() || answer == current {
        tracing::debug!("{}.{} unchanged", kind, key);
        return Ok(());
    }

    let answer = if kind == DocumentKind::Request {
        validate_request_field(&key, &answer)?;
        if key == "method" {
            answer.to_ascii_uppercase()
        } else {
            answer
        }
    } else {
        answer
    };

    document.set(&key, infer_value(&answer));
    if kind != DocumentKind::Variables {
        store_variable_info(&ctx.workspace, preset, kind, &document)?;
    }
    document.write()?;
    tracing::info!("edited {}.{} of preset '{}'", kind, key, preset);
    Ok(())
}

fn edit_document(ctx: &mut CommandContext<'_>, preset: &str, kind: DocumentKind) -> Result<()> {
    let ws = &ctx.workspace;
    let path = ws.document_path(preset, kind);
    let document = ws.load_document(preset, kind)?;
    let original = document.to_toml_pretty()?;

    let scratch = tempfile::Builder::new()
        .prefix(&format!("bluepreset-{}-", kind.as_str()))
        .suffix(".toml")
        .tempfile()
        .context("failed to create scratch file")?;
    fs::write(scratch.path(), &original).context("failed to write scratch file")?;

    run_editor(&ctx.editor, scratch.path())?;

    let edited = fs::read_to_string(scratch.path()).context("failed to read scratch file")?;
    if edited == original {
        tracing::debug!("{} unchanged", kind);
        return Ok(());
    }

    let mut updated = Document::parse(&edited)
        .with_context(|| format!("edited {kind} is not valid TOML; nothing was saved"))?;
    if kind == DocumentKind::Request {
        validate_request_document(&updated)
            .context("edited request is invalid; nothing was saved")?;
    }

    updated.bind(&path);
    updated.write()?;
    if kind != DocumentKind::Variables {
        store_variable_info(ws, preset, kind, &updated)?;
    }
    tracing::info!("replaced {} of preset '{}'", kind, preset);
    Ok(())
}

pub(super) fn run_editor(editor: &str, file: &std::path::Path) -> Result<()> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("no editor configured"))?;

    let status = process::Command::new(program)
        .args(parts)
        .arg(file)
        .status()
        .with_context(|| format!("failed to launch editor '{program}'"))?;
    if !status.success() {
        bail!("editor '{}' exited with {}; nothing was saved", program, status);
    }
    Ok(())
}

fn validate_request_document(document: &Document) -> Result<()> {
    for key in document.keys() {
        if let Some(value) = document.get(&key) {
            let text = match value {
                Value::Table(_) | Value::Array(_) => continue,
                other => other.to_plain_string(),
            };
            validate_request_field(&key, &text)?;
        }
    }
    Ok(())
}
