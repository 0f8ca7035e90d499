//! # Response History
//!
//! Bounded per-preset log of past responses under `<preset>/.history/`, one
//! pretty-printed JSON file per entry named `001.json`, `002.json`, ...
//!
//! Files are always contiguous from `001`. Storing into a full history deletes
//! the oldest entries, renumbers the rest as one all-or-nothing rename batch
//! (closing any gap left by a file removed by hand), then writes the new entry
//! as the highest number. Retrieval counts from the
//! most recent entry (index 1).

use crate::error::{Error, Result};
use crate::store::{atomic_write, batch_rename, RenameOp};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One stored response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub method: String,
    pub url: String,
    pub status: String,
    pub duration: String,
    pub headers: serde_json::Value,
    pub body: serde_json::Value,
}

impl HistoryEntry {
    /// Build an entry stamped with the current time. A body that parses as
    /// JSON is stored as JSON, anything else as a string.
    pub fn new(
        method: &str,
        url: &str,
        status: &str,
        duration: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> Self {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        let body = serde_json::from_str(body)
            .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));

        Self {
            timestamp: chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
            method: method.to_string(),
            url: url.to_string(),
            status: status.to_string(),
            duration: duration.to_string(),
            headers: serde_json::Value::Object(headers),
            body,
        }
    }
}

/// The history directory of one preset
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of stored entries
    pub fn count(&self) -> Result<usize> {
        Ok(self.files()?.len())
    }

    /// Append `entry`, keeping at most `capacity` entries. A capacity of zero
    /// or less disables history and stores nothing.
    pub fn store(&self, entry: &HistoryEntry, capacity: i64) -> Result<Option<PathBuf>> {
        if capacity <= 0 {
            tracing::debug!("history disabled, not storing response");
            return Ok(None);
        }
        let capacity = capacity as usize;

        fs::create_dir_all(&self.dir).map_err(|e| Error::io("create directory", &self.dir, e))?;

        let files = self.files()?;
        let evict = (files.len() + 1).saturating_sub(capacity);
        for (_, path) in &files[..evict] {
            fs::remove_file(path).map_err(|e| Error::io("remove", path, e))?;
            tracing::debug!("evicted {}", path.display());
        }
        // Survivors move down to 001.. so a removed file never leaves a gap
        let kept = &files[evict..];
        self.renumber(kept)?;
        let next = kept.len() + 1;

        let path = self.dir.join(file_name(next));
        let json = serde_json::to_string_pretty(entry)?;
        atomic_write(&path, json.as_bytes())?;
        tracing::info!("stored response as {}", path.display());
        Ok(Some(path))
    }

    /// Entries in chronological (file) order. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<HistoryEntry>> {
        let mut entries = Vec::new();
        for (_, path) in self.files()? {
            match read_entry(&path) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("skipping history file: {}", e),
            }
        }
        Ok(entries)
    }

    /// Entry `n`, counting back from the most recent (1)
    pub fn load(&self, preset: &str, n: usize) -> Result<HistoryEntry> {
        let files = self.files()?;
        if files.is_empty() {
            return Err(Error::NoHistory(preset.to_string()));
        }
        if n < 1 || n > files.len() {
            return Err(Error::HistoryNotFound {
                requested: n,
                available: files.len(),
            });
        }
        read_entry(&files[files.len() - n].1)
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io("remove", &self.dir, e)),
        }
    }

    /// Sequence-numbered entry files, sorted by number
    fn files(&self) -> Result<Vec<(u32, PathBuf)>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io("read directory", &self.dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::io("read directory", &self.dir, e))?
                .path();
            if let Some(number) = sequence_number(&path) {
                files.push((number, path));
            }
        }
        files.sort_by_key(|(number, _)| *number);
        Ok(files)
    }

    fn renumber(&self, remaining: &[(u32, PathBuf)]) -> Result<()> {
        let ops: Vec<RenameOp> = remaining
            .iter()
            .enumerate()
            .map(|(i, (_, from))| RenameOp {
                from: from.clone(),
                to: self.dir.join(file_name(i + 1)),
            })
            .filter(|op| op.from != op.to)
            .collect();
        tracing::debug!("renumbering {} history file(s)", ops.len());
        batch_rename(&ops)
    }
}

fn file_name(number: usize) -> String {
    format!("{number:03}.json")
}

fn sequence_number(path: &Path) -> Option<u32> {
    if path.extension()? != "json" {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

fn read_entry(path: &Path) -> Result<HistoryEntry> {
    let text = fs::read_to_string(path).map_err(|e| Error::io("read", path, e))?;
    Ok(serde_json::from_str(&text)?)
}
