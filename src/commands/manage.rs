//! Preset management: create, rm, copy, list, status, switch, export, import.

use super::edit::run_editor;
use super::{Command, CommandContext};
use crate::error::Error;
use crate::request::{export_to_curl, import_from_curl, parse_curl_words, validate_request_field};
use crate::variables::store_variable_info;
use crate::workspace::{DocumentKind, PresetRef};
use anyhow::{bail, Context as _, Result};
use std::fs;

pub(super) fn create(preset: &PresetRef, ctx: &mut CommandContext<'_>) -> Result<()> {
    let ws = &ctx.workspace;
    ws.create_preset(&preset.preset)?;
    if let Some(variant) = &preset.variant {
        ws.switch_variant(&preset.preset, variant)?;
    }
    ctx.session.set_current(&preset.preset)?;
    writeln!(ctx.out, "created {preset}")?;
    Ok(())
}

/// Remove each named preset (or `preset/variant`). Missing ones are reported
/// and skipped.
pub(super) fn remove(command: &Command, ctx: &mut CommandContext<'_>) -> Result<()> {
    if command.names.is_empty() {
        bail!("rm needs at least one preset");
    }

    for name in &command.names {
        let target = PresetRef::parse(name).with_context(|| format!("cannot remove '{name}'"))?;
        let removed = match &target.variant {
            Some(variant) => ctx.workspace.delete_variant(&target.preset, variant),
            None => ctx.workspace.delete_preset(&target.preset),
        };

        match removed {
            Ok(()) => {
                if target.variant.is_none() {
                    ctx.session.clear_if(&target.preset);
                }
                writeln!(ctx.out, "removed {target}")?;
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("skipping '{}': {}", target, e);
                eprintln!("warning: {e}");
            }
            Err(e) => return Err(e).with_context(|| format!("cannot remove '{target}'")),
        }
    }
    Ok(())
}

/// `copy <source> <destination>`; either side may be `name`, `name/variant`
/// or `/variant` of the current preset
pub(super) fn copy(command: &Command, ctx: &mut CommandContext<'_>) -> Result<()> {
    let [source, dest] = command.names.as_slice() else {
        bail!("copy needs a source and a destination");
    };
    let source = ctx.session.resolve(Some(source))?;
    let dest = ctx.session.resolve(Some(dest))?;

    ctx.workspace
        .copy(&source, &dest)
        .with_context(|| format!("cannot copy '{source}' to '{dest}'"))?;
    writeln!(ctx.out, "copied {source} to {dest}")?;
    Ok(())
}

pub(super) fn list(ctx: &mut CommandContext<'_>) -> Result<()> {
    let ws = &ctx.workspace;
    let current = ctx.session.current();

    for preset in ws.list_presets()? {
        let marker = if current == Some(preset.as_str()) { "*" } else { " " };
        writeln!(ctx.out, "{marker} {preset}")?;

        if ws.has_variants(&preset) {
            let active = ws.active_variant(&preset);
            for variant in ws.list_variants(&preset)? {
                let marker = if variant == active { "*" } else { " " };
                writeln!(ctx.out, "    {marker} /{variant}")?;
            }
        }
    }
    Ok(())
}

pub(super) fn status(command: &Command, ctx: &mut CommandContext<'_>) -> Result<()> {
    let preset = match ctx.session.resolve(command.preset.as_deref()) {
        Ok(preset) => preset,
        Err(Error::NoActivePreset) => {
            writeln!(ctx.out, "no active preset")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let ws = &ctx.workspace;
    let name = preset.preset.as_str();

    if !ws.preset_exists(name) {
        writeln!(ctx.out, "preset: {name} (does not exist)")?;
        return Ok(());
    }

    writeln!(ctx.out, "preset: {name}")?;
    if ws.has_variants(name) {
        writeln!(ctx.out, "active variant: {}", ws.active_variant(name))?;
        writeln!(ctx.out, "variants: {}", ws.list_variants(name)?.join(", "))?;
    }

    let documents: Vec<&str> = ws
        .materialized_documents(name)
        .iter()
        .map(DocumentKind::as_str)
        .collect();
    if documents.is_empty() {
        writeln!(ctx.out, "documents: (none)")?;
    } else {
        writeln!(ctx.out, "documents: {}", documents.join(", "))?;
    }

    let capacity = ws
        .load_document(name, DocumentKind::Request)?
        .get_as_int("history_count")
        .unwrap_or(0);
    let stored = ws.history(name).count()?;
    writeln!(ctx.out, "history: {stored} of {capacity}")?;
    Ok(())
}

/// `switch <variant>`: select a variant of the current preset, creating it
/// if needed
pub(super) fn switch(command: &Command, ctx: &mut CommandContext<'_>) -> Result<()> {
    let variant = command
        .names
        .first()
        .ok_or_else(|| anyhow::anyhow!("switch needs a variant name"))?;
    let preset = ctx.session.resolve(Some(&format!("/{variant}")))?;

    ctx.workspace
        .switch_variant(&preset.preset, variant)
        .with_context(|| format!("switch failed for '{preset}'"))?;
    writeln!(ctx.out, "switched to {preset}")?;
    Ok(())
}

pub(super) fn export(preset: &str, ctx: &mut CommandContext<'_>) -> Result<()> {
    let ws = &ctx.workspace;
    let request = ws.load_document(preset, DocumentKind::Request)?;
    let headers = ws.load_document(preset, DocumentKind::Headers)?;
    let body = ws.load_document(preset, DocumentKind::Body)?;
    let query = ws.load_document(preset, DocumentKind::Query)?;

    let curl = export_to_curl(&request, &headers, &body, &query)?;
    writeln!(ctx.out, "{curl}")?;
    Ok(())
}

/// `import <preset> [curl ...]`: fill the preset from a curl command, or from
/// one pasted into the editor when none is given. Headers and query merge
/// into what the preset has; the body is replaced.
pub(super) fn import(command: &Command, preset: &str, ctx: &mut CommandContext<'_>) -> Result<()> {
    let imported = match command.names.as_slice() {
        [] => import_from_curl(&curl_from_editor(&ctx.editor)?)?,
        [line] => import_from_curl(line)?,
        words => parse_curl_words(words)?,
    };
    for key in imported.request.keys() {
        validate_request_field(&key, &imported.request.get_as_string(&key))?;
    }

    let ws = &ctx.workspace;
    let mut written = Vec::new();
    for (kind, document) in [
        (DocumentKind::Request, &imported.request),
        (DocumentKind::Headers, &imported.headers),
        (DocumentKind::Query, &imported.query),
        (DocumentKind::Body, &imported.body),
    ] {
        if document.is_empty() {
            continue;
        }
        let mut target = ws.load_document(preset, kind)?;
        if kind == DocumentKind::Body {
            *target.table_mut() = document.table().clone();
        } else {
            target.merge(document);
        }
        store_variable_info(ws, preset, kind, &target)?;
        target.write()?;
        written.push(kind.as_str());
    }

    tracing::info!("imported curl command into preset '{}'", preset);
    writeln!(ctx.out, "imported {} into {preset}", written.join(", "))?;
    Ok(())
}

fn curl_from_editor(editor: &str) -> Result<String> {
    let scratch = tempfile::Builder::new()
        .prefix("bluepreset-curl-")
        .suffix(".txt")
        .tempfile()
        .context("failed to create scratch file")?;
    run_editor(editor, scratch.path())?;

    let text = fs::read_to_string(scratch.path()).context("failed to read scratch file")?;
    let text = text.trim();
    if text.is_empty() {
        bail!("no curl command given; nothing was imported");
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use crate::commands::tests_support::TestBench;
    use crate::workspace::DocumentKind;

    #[tokio::test]
    async fn test_create_and_list() {
        let mut bench = TestBench::new();
        bench.run(&["create", "beta"]).await.unwrap();
        bench.run(&["create", "alpha/prod"]).await.unwrap();
        bench.take_output();

        bench.run(&["list"]).await.unwrap();
        assert_eq!(bench.take_output(), "* alpha\n    * /prod\n  beta\n");
    }

    #[tokio::test]
    async fn test_bulk_remove_skips_missing() {
        let mut bench = TestBench::new();
        bench.run(&["create", "a"]).await.unwrap();
        bench.run(&["create", "b"]).await.unwrap();
        bench.take_output();

        bench.run(&["rm", "a", "ghost", "b"]).await.unwrap();
        assert_eq!(bench.take_output(), "removed a\nremoved b\n");
        assert!(bench.workspace().list_presets().unwrap().is_empty());
        assert_eq!(bench.session_current(), None);
    }

    #[tokio::test]
    async fn test_remove_takes_history_along() {
        let mut bench = TestBench::new();
        bench.run(&["create", "api"]).await.unwrap();
        let history = bench.workspace().history("api");
        let entry = crate::history::HistoryEntry::new("GET", "https://x", "200 OK", "1ms", &[], "");
        history.store(&entry, 5).unwrap();

        bench.run(&["rm", "api"]).await.unwrap();
        assert!(!history.dir().exists());
    }

    #[tokio::test]
    async fn test_switch_relative_variant() {
        let mut bench = TestBench::new();
        bench.run(&["set", "api", "url", "https://prod"]).await.unwrap();
        bench.run(&["switch", "prod"]).await.unwrap();
        bench.run(&["switch", "dev"]).await.unwrap();
        bench.run(&["set", "/dev", "url", "https://dev"]).await.unwrap();

        let ws = bench.workspace();
        assert_eq!(ws.list_variants("api").unwrap(), vec!["dev", "prod"]);
        assert_eq!(ws.active_variant("api"), "dev");
        assert_eq!(
            bench.document("api", DocumentKind::Request).get_as_string("url"),
            "https://dev"
        );

        bench.run(&["switch", "prod"]).await.unwrap();
        assert_eq!(
            bench.document("api", DocumentKind::Request).get_as_string("url"),
            "https://prod"
        );
    }

    #[tokio::test]
    async fn test_switch_without_session_fails() {
        let mut bench = TestBench::new();
        let err = bench.run(&["switch", "prod"]).await.unwrap_err();
        assert!(format!("{err:#}").contains("no active preset"));
    }

    #[tokio::test]
    async fn test_variant_of_missing_preset() {
        let mut bench = TestBench::new();
        let err = bench.run(&["get", "ghost/prod"]).await.unwrap_err();
        assert!(format!("{err:#}").contains("base preset 'ghost' does not exist"));
    }

    #[tokio::test]
    async fn test_status() {
        let mut bench = TestBench::new();
        bench.run(&["status"]).await.unwrap();
        assert_eq!(bench.take_output(), "no active preset\n");

        bench.run(&["set", "api", "url", "https://x"]).await.unwrap();
        bench.run(&["set", "api", "history", "10"]).await.unwrap();
        bench.run(&["switch", "prod"]).await.unwrap();
        bench.take_output();

        bench.run(&["status"]).await.unwrap();
        assert_eq!(
            bench.take_output(),
            "preset: api\nactive variant: prod\nvariants: prod\ndocuments: request\nhistory: 0 of 10\n"
        );
    }

    #[tokio::test]
    async fn test_export() {
        let mut bench = TestBench::new();
        bench.run(&["set", "api", "url", "https://x/items"]).await.unwrap();
        bench.run(&["set", "api", "headers", "Authorization={@auth}"]).await.unwrap();

        bench.run(&["export"]).await.unwrap();
        assert_eq!(
            bench.take_output(),
            "curl \\\n  'https://x/items' \\\n  -H 'Authorization: {@auth}'\n"
        );
    }

    #[tokio::test]
    async fn test_copy_in_every_direction() {
        let mut bench = TestBench::new();
        bench.run(&["set", "api", "url", "https://api"]).await.unwrap();
        bench.run(&["set", "api", "headers", "X-Key=k"]).await.unwrap();

        bench.run(&["copy", "api", "api2"]).await.unwrap();
        bench.run(&["cp", "api", "api2/prod"]).await.unwrap();
        bench.run(&["set", "api2/prod", "url", "https://prod"]).await.unwrap();
        bench.run(&["copy", "api2/prod", "api2/dev"]).await.unwrap();
        bench.run(&["copy", "api2/dev", "solo"]).await.unwrap();
        assert_eq!(
            bench.take_output(),
            "copied api to api2\ncopied api to api2/prod\ncopied api2/prod to api2/dev\ncopied api2/dev to solo\n"
        );

        let ws = bench.workspace();
        assert_eq!(ws.list_variants("api2").unwrap(), vec!["dev", "prod"]);
        assert_eq!(ws.active_variant("api2"), "dev");
        let url = |name: &str| bench.document(name, DocumentKind::Request).get_as_string("url");
        assert_eq!(url("api"), "https://api");
        assert_eq!(url("api2"), "https://prod");
        assert_eq!(url("solo"), "https://prod");
        assert_eq!(
            bench.document("solo", DocumentKind::Headers).get_as_string("X-Key"),
            "k"
        );
        assert!(!ws.has_variants("solo"));
    }

    #[tokio::test]
    async fn test_copy_refuses_existing_preset() {
        let mut bench = TestBench::new();
        bench.run(&["create", "a"]).await.unwrap();
        bench.run(&["create", "b"]).await.unwrap();
        let err = bench.run(&["copy", "a", "b"]).await.unwrap_err();
        assert!(format!("{err:#}").contains("preset 'b' already exists"));
        assert!(bench.run(&["copy", "ghost", "c"]).await.is_err());
    }

    #[tokio::test]
    async fn test_import_from_words() {
        let mut bench = TestBench::new();
        bench.run(&["set", "api", "headers", "Accept=*/*"]).await.unwrap();
        bench.run(&["set", "api", "body", "old=1"]).await.unwrap();

        bench
            .run(&[
                "import",
                "api",
                "curl",
                "-X",
                "POST",
                "https://x/users?v=1",
                "-H",
                "Authorization: Bearer {@token}",
                "-d",
                "{\"name\":\"ana\"}",
            ])
            .await
            .unwrap();
        assert_eq!(
            bench.take_output(),
            "imported request, headers, query, body into api\n"
        );

        let request = bench.document("api", DocumentKind::Request);
        assert_eq!(request.get_as_string("url"), "https://x/users");
        assert_eq!(request.get_as_string("method"), "POST");
        let headers = bench.document("api", DocumentKind::Headers);
        assert_eq!(headers.get_as_string("Accept"), "*/*");
        assert_eq!(headers.get_as_string("Authorization"), "Bearer {@token}");
        assert_eq!(bench.document("api", DocumentKind::Query).get_as_string("v"), "1");
        let body = bench.document("api", DocumentKind::Body);
        assert_eq!(body.keys(), vec!["name"]);
        assert!(bench
            .document("api", DocumentKind::Variables)
            .has("headers.Authorization"));
    }

    #[tokio::test]
    async fn test_import_then_export_matches() {
        let mut bench = TestBench::new();
        let curl = "curl \\\n  -G \\\n  --data-urlencode 'q=a b' \\\n  'https://x/search' \\\n  -H 'Accept: application/json'";
        bench.run(&["import", "search", curl]).await.unwrap();
        bench.take_output();

        bench.run(&["export", "search"]).await.unwrap();
        assert_eq!(bench.take_output(), format!("{curl}\n"));
        assert_eq!(bench.session_current(), Some("search".to_string()));
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_command_without_writing() {
        let mut bench = TestBench::new();
        let err = bench
            .run(&["import", "api", "curl ftp://nope"])
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("ftp://nope"));
        assert!(bench.workspace().materialized_documents("api").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_import_from_editor() {
        let mut bench = TestBench::new();
        let script = bench.write_script(
            "paste.sh",
            "#!/bin/sh\nprintf 'curl https://x/from-editor\\n' > \"$1\"\n",
        );
        bench.set_editor(&script);
        bench.run(&["import", "pasted"]).await.unwrap();
        assert_eq!(
            bench
                .document("pasted", DocumentKind::Request)
                .get_as_string("url"),
            "https://x/from-editor"
        );

        let empty = bench.write_script("empty.sh", "#!/bin/sh\n: > \"$1\"\n");
        bench.set_editor(&empty);
        let err = bench.run(&["import", "pasted"]).await.unwrap_err();
        assert!(format!("{err:#}").contains("no curl command given"));
    }
}
