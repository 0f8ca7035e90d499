//! # Preset Workspace
//!
//! Maps presets and their variants onto the config directory:
//!
//! ```text
//! <config-root>/presets/<preset>/
//!   request.toml | headers.toml | query.toml | body.toml | variables.toml
//!   .config                      active variant name (only once variants exist)
//!   variants/<variant>/<the same five files>
//!   .history/NNN.json
//! ```
//!
//! A preset without a `variants/` directory keeps its documents at its root.
//! Once a variant exists, every document is read from the active variant.

pub mod copy;
pub mod session;
pub mod variant;

pub use session::Session;
pub use variant::{resolve_variant, VariantResolution};

use crate::config::{HISTORY_DIR_NAME, VARIANTS_DIR_NAME};
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::store::Document;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The five document kinds a preset is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Request,
    Headers,
    Query,
    Body,
    Variables,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Request,
        DocumentKind::Headers,
        DocumentKind::Query,
        DocumentKind::Body,
        DocumentKind::Variables,
    ];

    /// Kinds that feed the outbound request (everything but `variables`)
    pub const REQUEST_BEARING: [DocumentKind; 4] = [
        DocumentKind::Body,
        DocumentKind::Headers,
        DocumentKind::Query,
        DocumentKind::Request,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Request => "request",
            DocumentKind::Headers => "headers",
            DocumentKind::Query => "query",
            DocumentKind::Body => "body",
            DocumentKind::Variables => "variables",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.toml", self.as_str())
    }

    /// Kind for a canonical target name (see `commands::normalize_target`)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject names that cannot be a single directory component
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name cannot be '.' or '..'")
    } else if name.starts_with('.') {
        Some("name cannot start with '.'")
    } else if name.contains(['/', '\\']) {
        Some("name cannot contain path separators")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// A preset address: `name` or `name/variant`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetRef {
    pub preset: String,
    pub variant: Option<String>,
}

impl PresetRef {
    pub fn parse(text: &str) -> Result<Self> {
        let (preset, variant) = match text.split_once('/') {
            Some((preset, variant)) => (preset, Some(variant)),
            None => (text, None),
        };

        validate_name(preset)?;
        if let Some(variant) = variant {
            validate_name(variant)?;
        }

        Ok(Self {
            preset: preset.to_string(),
            variant: variant.map(str::to_string),
        })
    }
}

impl fmt::Display for PresetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}/{}", self.preset, variant),
            None => f.write_str(&self.preset),
        }
    }
}

/// Base preset name of `name` or `name/variant`
pub fn base_name(preset: &str) -> &str {
    preset.split('/').next().unwrap_or(preset)
}

/// Root of the preset tree
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace under the configured presets directory
    pub fn open_default() -> Self {
        Self::new(crate::config::presets_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn preset_path(&self, preset: &str) -> PathBuf {
        self.root.join(base_name(preset))
    }

    pub fn preset_exists(&self, preset: &str) -> bool {
        self.preset_path(preset).is_dir()
    }

    /// Create the preset directory. Idempotent; no documents are written.
    pub fn create_preset(&self, preset: &str) -> Result<PathBuf> {
        let name = base_name(preset);
        validate_name(name)?;
        let path = self.preset_path(name);
        fs::create_dir_all(&path).map_err(|e| Error::io("create directory", &path, e))?;
        tracing::debug!("preset directory ready at {}", path.display());
        Ok(path)
    }

    /// Remove the preset and everything under it
    pub fn delete_preset(&self, preset: &str) -> Result<()> {
        let name = base_name(preset);
        let path = self.preset_path(name);
        if !path.is_dir() {
            return Err(Error::PresetNotFound(name.to_string()));
        }
        fs::remove_dir_all(&path).map_err(|e| Error::io("remove", &path, e))?;
        tracing::info!("deleted preset '{}'", name);
        Ok(())
    }

    /// Preset names, sorted
    pub fn list_presets(&self) -> Result<Vec<String>> {
        list_dirs(&self.root)
    }

    pub fn has_variants(&self, preset: &str) -> bool {
        self.variants_dir(preset).is_dir()
    }

    /// Directory the documents of `preset` currently live in
    pub fn document_dir(&self, preset: &str) -> PathBuf {
        if self.has_variants(preset) {
            self.variants_dir(preset).join(self.active_variant(preset))
        } else {
            self.preset_path(preset)
        }
    }

    pub fn document_path(&self, preset: &str, kind: DocumentKind) -> PathBuf {
        self.document_dir(preset).join(kind.file_name())
    }

    /// Load a document of the preset (or of its active variant). Parent
    /// directories are created as needed; the file itself only appears once
    /// the document is written.
    pub fn load_document(&self, preset: &str, kind: DocumentKind) -> Result<Document> {
        let dir = self.document_dir(preset);
        fs::create_dir_all(&dir).map_err(|e| Error::io("create directory", &dir, e))?;
        Document::load(&dir.join(kind.file_name()))
    }

    /// Kinds whose file exists for the preset's current document directory
    pub fn materialized_documents(&self, preset: &str) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|kind| self.document_path(preset, *kind).is_file())
            .collect()
    }

    /// Response history of the preset (shared by all of its variants)
    pub fn history(&self, preset: &str) -> HistoryStore {
        HistoryStore::new(self.preset_path(preset).join(HISTORY_DIR_NAME))
    }

    pub(crate) fn variants_dir(&self, preset: &str) -> PathBuf {
        self.preset_path(preset).join(VARIANTS_DIR_NAME)
    }
}

/// Sorted names of the directories directly under `dir`; empty if `dir` is missing
pub(crate) fn list_dirs(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io("read directory", dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("read directory", dir, e))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
