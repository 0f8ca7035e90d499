//! # Config Documents
//!
//! A [`Document`] is one TOML file (`request.toml`, `headers.toml`, ...) held
//! in memory as a [`Table`] and addressed by dotted paths.
//!
//! Loading never fails on a missing file: the result is an empty document bound
//! to that path, and only [`Document::write`] materializes it. Writing an empty
//! document produces a zero-length file.

use super::atomic::atomic_write;
use super::value::{Table, Value};
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    path: Option<PathBuf>,
    root: Table,
}

impl Document {
    /// An empty document not bound to any file
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the document at `path`, or an empty one bound to `path` if the
    /// file does not exist yet
    pub fn load(path: &Path) -> Result<Self> {
        let root = match fs::read_to_string(path) {
            Ok(text) => parse_table(&text, path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist yet, starting empty", path.display());
                Table::new()
            }
            Err(e) => return Err(Error::io("read", path, e)),
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            root,
        })
    }

    /// Parse TOML text into an unbound document
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            path: None,
            root: parse_table(text, Path::new("<inline>"))?,
        })
    }

    pub fn from_table(root: Table) -> Self {
        Self { path: None, root }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Point subsequent writes at `path`
    pub fn bind(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    pub fn table(&self) -> &Table {
        &self.root
    }

    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get_path(key)
    }

    /// Value rendered as plain text, or an empty string when absent
    pub fn get_as_string(&self, key: &str) -> String {
        self.get(key).map(Value::to_plain_string).unwrap_or_default()
    }

    /// Integer value, accepting integer-looking strings
    pub fn get_as_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.root.set_path(key, value.into());
    }

    /// Set a top-level key taken literally, dots included
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.root.insert(key, value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn delete(&mut self, key: &str) -> Result<Value> {
        self.root
            .remove_path(key)
            .ok_or_else(|| Error::KeyNotFound {
                key: key.to_string(),
                target: self.display_name(),
            })
    }

    /// Top-level keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.root.keys().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Deep-merge `other` into this document; see [`Table::merge`]
    pub fn merge(&mut self, other: &Document) {
        self.root.merge(&other.root);
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        self.root.to_json()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.root.to_json())?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(&self.root.to_toml())?)
    }

    pub fn to_toml_pretty(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.root.to_toml())?)
    }

    /// Persist to the bound path via atomic replace
    pub fn write(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.write_to(path),
            None => Err(Error::io(
                "write",
                "<unbound document>",
                io::Error::new(io::ErrorKind::InvalidInput, "document has no path"),
            )),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let text = self.to_toml_string()?;
        atomic_write(path, text.as_bytes())?;
        tracing::debug!("wrote {}", path.display());
        Ok(())
    }

    fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

fn parse_table(text: &str, path: &Path) -> Result<Table> {
    if text.trim().is_empty() {
        return Ok(Table::new());
    }
    toml::from_str::<toml::Table>(text)
        .map(Table::from_toml)
        .map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
}
