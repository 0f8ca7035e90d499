//! # Error Types
//!
//! Every fallible operation below the command layer returns [`Result`].
//! Variants fall into four classes: not-found, validation, IO/parse, and
//! transport. The command layer wraps these with `anyhow` context naming the
//! operation and target before they reach the user.

use std::path::{Path, PathBuf};

/// Errors raised by the workspace, stores and request assembly
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("preset '{0}' does not exist")]
    PresetNotFound(String),

    #[error("variant '{variant}' does not exist in preset '{preset}'")]
    VariantNotFound { preset: String, variant: String },

    #[error("cannot create variant: base preset '{0}' does not exist")]
    VariantPresetMissing(String),

    #[error("no active preset; name one explicitly or select one first")]
    NoActivePreset,

    #[error("key '{key}' not found in {target}")]
    KeyNotFound { key: String, target: String },

    #[error("no history found for preset '{0}'")]
    NoHistory(String),

    #[error("history response {requested} not found (available: 1-{available})")]
    HistoryNotFound { requested: usize, available: usize },

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("URL must start with http:// or https:// (got '{0}')")]
    InvalidUrl(String),

    #[error("no URL configured; set one with: set <preset> url <url>")]
    MissingUrl,

    #[error("timeout must be a non-negative number of seconds (got '{0}')")]
    InvalidTimeout(String),

    #[error("invalid history count '{value}': {reason}")]
    InvalidHistoryCount { value: String, reason: String },

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("expected key=value, got '{0}'")]
    InvalidKeyValue(String),

    #[error("preset '{0}' already exists")]
    PresetExists(String),

    #[error("cannot copy '{0}' onto itself")]
    CopyOntoItself(String),

    #[error("cannot import curl command: {0}")]
    InvalidCurl(String),

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("failed to read input: {0}")]
    Input(#[source] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an IO error tagged with the failing action and path
    pub fn io(action: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the error reports a missing preset, variant, key or history entry
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::PresetNotFound(_)
                | Error::VariantNotFound { .. }
                | Error::VariantPresetMissing(_)
                | Error::NoActivePreset
                | Error::KeyNotFound { .. }
                | Error::NoHistory(_)
                | Error::HistoryNotFound { .. }
        )
    }

    /// Whether the error rejects user-supplied input before any write
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidMethod(_)
                | Error::InvalidUrl(_)
                | Error::MissingUrl
                | Error::InvalidTimeout(_)
                | Error::InvalidHistoryCount { .. }
                | Error::InvalidName { .. }
                | Error::InvalidKeyValue(_)
                | Error::PresetExists(_)
                | Error::CopyOntoItself(_)
                | Error::InvalidCurl(_)
        )
    }
}
