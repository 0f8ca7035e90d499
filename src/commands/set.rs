//! `set <preset> <target> key=value...`

use super::{call, document_kind, request_field_key, CommandContext};
use crate::request::validate_request_field;
use crate::store::infer_value;
use crate::variables::store_variable_info;
use crate::workspace::DocumentKind;
use anyhow::{bail, Result};

pub(super) async fn run(
    command: &super::Command,
    preset: &str,
    ctx: &mut CommandContext<'_>,
) -> Result<()> {
    let target = command
        .target
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("set needs a target"))?;
    let kind = document_kind(target)?;
    if command.pairs.is_empty() {
        bail!("nothing to set; pass key=value");
    }

    // Validate everything before writing anything
    let mut updates = Vec::with_capacity(command.pairs.len());
    for pair in &command.pairs {
        let (key, value) = if kind == DocumentKind::Request {
            let key = request_field_key(&pair.key);
            validate_request_field(&key, &pair.value)?;
            let value = if key == "method" {
                pair.value.to_ascii_uppercase()
            } else {
                pair.value.clone()
            };
            (key, value)
        } else {
            (pair.key.clone(), pair.value.clone())
        };
        updates.push((key, value));
    }

    let ws = &ctx.workspace;
    let mut document = ws.load_document(preset, kind)?;
    for (key, value) in &updates {
        document.set(key, infer_value(value));
        tracing::debug!("{}.{} = {}", kind, key, value);
    }
    if kind != DocumentKind::Variables {
        store_variable_info(ws, preset, kind, &document)?;
    }
    document.write()?;
    tracing::info!("updated {} of preset '{}'", kind, preset);

    if command.flags.call {
        call::run(command, preset, ctx).await?;
    }
    Ok(())
}
