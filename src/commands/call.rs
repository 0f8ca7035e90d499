//! `call [preset]`: resolve variables, assemble, send, record.

use super::render::write_entry;
use super::{Command, CommandContext};
use crate::http::HttpService;
use crate::request::{build, RequestDescriptor};
use crate::variables::{prompt_for_specific, prompt_for_variables, substitute_variables};
use crate::workspace::DocumentKind;
use anyhow::{Context as _, Result};

pub(super) async fn run(command: &Command, preset: &str, ctx: &mut CommandContext<'_>) -> Result<()> {
    let request = prepare(command, preset, ctx)?;

    if command.flags.dry_run {
        write!(ctx.out, "{request}")?;
        return Ok(());
    }

    let http = HttpService::new()?;
    let response = http.execute(&request).await?;
    let entry = response.to_history_entry(&request);
    write_entry(ctx.out, &entry, command.flags.display, command.flags.raw)?;

    let capacity = ctx
        .workspace
        .load_document(preset, DocumentKind::Request)?
        .get_as_int("history_count")
        .unwrap_or(0);
    ctx.workspace
        .history(preset)
        .store(&entry, capacity)
        .context("response received but could not be saved to history")?;
    Ok(())
}

/// Resolve placeholders and assemble the request without sending it
fn prepare(command: &Command, preset: &str, ctx: &mut CommandContext<'_>) -> Result<RequestDescriptor> {
    let ws = &ctx.workspace;
    let substitutions = match &command.flags.vars {
        Some(names) => prompt_for_specific(ws, preset, names, &mut *ctx.prompter)?,
        None => prompt_for_variables(ws, preset, command.flags.persist, &mut *ctx.prompter)?,
    };

    let load = |kind: DocumentKind| -> Result<_> {
        let mut document = ws.load_document(preset, kind)?;
        let changed = substitute_variables(&mut document, kind, &substitutions);
        if changed > 0 {
            tracing::debug!("substituted {} value(s) in {}", changed, kind);
        }
        Ok(document)
    };

    let request = load(DocumentKind::Request)?;
    let headers = load(DocumentKind::Headers)?;
    let body = load(DocumentKind::Body)?;
    let query = load(DocumentKind::Query)?;

    Ok(build(&request, &headers, &body, &query)?)
}
