//! Console rendering of responses and history entries.

use super::ResponseDisplay;
use crate::history::HistoryEntry;
use anyhow::Result;
use std::io::Write;

/// Print a response (live or from history) in the requested display mode
pub(super) fn write_entry(
    out: &mut dyn Write,
    entry: &HistoryEntry,
    display: ResponseDisplay,
    raw: bool,
) -> Result<()> {
    match display {
        ResponseDisplay::StatusOnly => {
            writeln!(out, "{}", entry.status)?;
        }
        ResponseDisplay::HeadersOnly => write_headers(out, entry)?,
        ResponseDisplay::BodyOnly => writeln!(out, "{}", body_text(&entry.body, raw))?,
        ResponseDisplay::Full => {
            writeln!(out, "{} ({})", entry.status, entry.duration)?;
            write_headers(out, entry)?;
            let body = body_text(&entry.body, raw);
            if !body.is_empty() {
                writeln!(out)?;
                writeln!(out, "{body}")?;
            }
        }
    }
    Ok(())
}

fn write_headers(out: &mut dyn Write, entry: &HistoryEntry) -> Result<()> {
    if let Some(headers) = entry.headers.as_object() {
        for (name, value) in headers {
            match value.as_str() {
                Some(text) => writeln!(out, "{name}: {text}")?,
                None => writeln!(out, "{name}: {value}")?,
            }
        }
    }
    Ok(())
}

/// Text bodies as they are; JSON as TOML, or pretty JSON when `raw` is set
/// or the JSON has no TOML form
pub(super) fn body_text(body: &serde_json::Value, raw: bool) -> String {
    if let Some(text) = body.as_str() {
        return text.to_string();
    }
    let pretty_json = || serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    if raw {
        return pretty_json();
    }
    match toml::to_string_pretty(body) {
        Ok(text) => text.trim_end().to_string(),
        Err(_) => pretty_json(),
    }
}
