//! `get <preset> [target] [key]`, plus `get history` and `get response [n]`.

use super::render::write_entry;
use super::{document_kind, request_field_key, Command, CommandContext};
use crate::error::Error;
use crate::store::{Document, Value};
use crate::workspace::DocumentKind;
use anyhow::{Context as _, Result};

pub(super) fn run(command: &Command, preset: &str, ctx: &mut CommandContext<'_>) -> Result<()> {
    let key = command.names.first().map(String::as_str);

    match command.target.as_deref() {
        None => show_all(preset, command.flags.raw, ctx),
        Some(target) if target.eq_ignore_ascii_case("history") => show_history(preset, ctx),
        Some(target) if target.eq_ignore_ascii_case("response") => {
            show_response(command, preset, key, ctx)
        }
        Some(target) => {
            let kind = document_kind(target)?;
            let document = ctx.workspace.load_document(preset, kind)?;
            match key {
                None => write_document(ctx, &document, command.flags.raw),
                Some(key) => {
                    let key = if kind == DocumentKind::Request {
                        request_field_key(key)
                    } else {
                        key.to_string()
                    };
                    let value = document.get(&key).ok_or_else(|| Error::KeyNotFound {
                        key: key.clone(),
                        target: kind.as_str().to_string(),
                    })?;
                    write_value(ctx, value, command.flags.raw)
                }
            }
        }
    }
}

fn show_all(preset: &str, raw: bool, ctx: &mut CommandContext<'_>) -> Result<()> {
    let mut shown = 0;
    for kind in DocumentKind::ALL {
        let document = ctx.workspace.load_document(preset, kind)?;
        if document.is_empty() {
            continue;
        }
        if shown > 0 {
            writeln!(ctx.out)?;
        }
        writeln!(ctx.out, "# {kind}")?;
        write_document(ctx, &document, raw)?;
        shown += 1;
    }
    if shown == 0 {
        writeln!(ctx.out, "preset '{preset}' is empty")?;
    }
    Ok(())
}

fn write_document(ctx: &mut CommandContext<'_>, document: &Document, raw: bool) -> Result<()> {
    let text = if raw {
        serde_json::to_string_pretty(&document.to_json_value())?
    } else {
        document.to_toml_pretty()?
    };
    writeln!(ctx.out, "{}", text.trim_end())?;
    Ok(())
}

fn write_value(ctx: &mut CommandContext<'_>, value: &Value, raw: bool) -> Result<()> {
    match value {
        Value::Table(table) => {
            write_document(ctx, &Document::from_table(table.clone()), raw)?;
        }
        other if raw => writeln!(ctx.out, "{}", other.to_json())?,
        other => writeln!(ctx.out, "{other}")?,
    }
    Ok(())
}

fn show_history(preset: &str, ctx: &mut CommandContext<'_>) -> Result<()> {
    let entries = ctx.workspace.history(preset).list()?;
    if entries.is_empty() {
        writeln!(ctx.out, "no history for preset '{preset}'")?;
        return Ok(());
    }
    for (index, entry) in entries.iter().rev().enumerate() {
        writeln!(
            ctx.out,
            "{:>3}  {}  {} {}  {}  {}",
            index + 1,
            entry.timestamp,
            entry.method,
            entry.url,
            entry.status,
            entry.duration
        )?;
    }
    Ok(())
}

fn show_response(
    command: &Command,
    preset: &str,
    index: Option<&str>,
    ctx: &mut CommandContext<'_>,
) -> Result<()> {
    let n = match index {
        Some(text) => text
            .parse::<usize>()
            .with_context(|| format!("response number must be a positive integer, got '{text}'"))?,
        None => 1,
    };
    let entry = ctx.workspace.history(preset).load(preset, n)?;
    write_entry(ctx.out, &entry, command.flags.display, command.flags.raw)
}

#[cfg(test)]
mod tests {
    use crate::commands::tests_support::TestBench;
    use crate::history::HistoryEntry;

    #[tokio::test]
    async fn test_get_value_and_document() {
        let mut bench = TestBench::new();
        bench
            .run(&["set", "api", "body", "user.active=true", "user.name=ana"])
            .await
            .unwrap();

        bench.run(&["get", "api", "body", "user.active"]).await.unwrap();
        assert_eq!(bench.take_output(), "true\n");

        bench.run(&["get", "api", "body", "user"]).await.unwrap();
        assert_eq!(bench.take_output(), "active = true\nname = \"ana\"\n");

        bench.run(&["get", "api", "body", "--raw"]).await.unwrap();
        assert_eq!(
            bench.take_output(),
            "{\n  \"user\": {\n    \"active\": true,\n    \"name\": \"ana\"\n  }\n}\n"
        );
    }

    #[tokio::test]
    async fn test_get_special_request_field() {
        let mut bench = TestBench::new();
        bench.run(&["set", "api", "history", "3"]).await.unwrap();
        bench.run(&["get", "api", "history_count"]).await.unwrap_err();
        bench.run(&["get", "api", "request", "history"]).await.unwrap();
        assert_eq!(bench.take_output(), "3\n");
    }

    #[tokio::test]
    async fn test_get_missing_key_and_preset() {
        let mut bench = TestBench::new();
        bench.run(&["set", "api", "body", "a=1"]).await.unwrap();

        let err = bench.run(&["get", "api", "body", "b"]).await.unwrap_err();
        assert!(format!("{err:#}").contains("key 'b' not found in body"));

        let err = bench.run(&["get", "ghost", "body"]).await.unwrap_err();
        assert!(format!("{err:#}").contains("preset 'ghost' does not exist"));
    }

    #[tokio::test]
    async fn test_get_history_and_response() {
        let mut bench = TestBench::new();
        bench.run(&["create", "api"]).await.unwrap();
        let history = bench.workspace().history("api");
        for n in 1..=2 {
            let entry = HistoryEntry::new(
                "GET",
                &format!("https://x/{n}"),
                "200 OK",
                "1ms",
                &[],
                &format!("{{\"n\":{n}}}"),
            );
            history.store(&entry, 10).unwrap();
        }

        bench.run(&["get", "api", "history"]).await.unwrap();
        let listing = bench.take_output();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1  ") && lines[0].contains("https://x/2"));
        assert!(lines[1].contains("https://x/1"));

        bench
            .run(&["get", "api", "response", "2", "--body-only"])
            .await
            .unwrap();
        assert_eq!(bench.take_output(), "n = 1\n");

        let err = bench.run(&["get", "api", "response", "3"]).await.unwrap_err();
        assert!(format!("{err:#}").contains("available: 1-2"));
    }

    #[tokio::test]
    async fn test_get_everything() {
        let mut bench = TestBench::new();
        bench.run(&["create", "api"]).await.unwrap();
        bench.run(&["get", "api"]).await.unwrap();
        assert_eq!(bench.take_output(), "preset 'api' is empty\n");

        bench.run(&["set", "api", "url", "https://x"]).await.unwrap();
        bench.run(&["set", "api", "headers", "Accept=*/*"]).await.unwrap();
        bench.run(&["get", "api"]).await.unwrap();
        assert_eq!(
            bench.take_output(),
            "# request\nurl = \"https://x\"\n\n# headers\nAccept = \"*/*\"\n"
        );
    }
}
