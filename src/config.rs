//! Configuration constants and utilities for bluepreset
//!
//! Holds the on-disk layout names and request defaults, plus resolution of the
//! config root (`~/.config/bluepreset` unless overridden by environment).

use std::path::PathBuf;

/// Default config root for bluepreset
pub const DEFAULT_CONFIG_ROOT: &str = "~/.config/bluepreset";

/// Environment variable name for overriding the config root
pub const CONFIG_ROOT_ENV_VAR: &str = "BLUEPRESET_CONFIG_ROOT";

/// Environment variable holding the tracing filter directive
pub const LOG_ENV_VAR: &str = "BLUEPRESET_LOG";

/// Directory under the config root that holds one directory per preset
pub const PRESETS_DIR_NAME: &str = "presets";

/// Directory under a preset that holds its variants
pub const VARIANTS_DIR_NAME: &str = "variants";

/// Marker file naming the active variant
pub const ACTIVE_VARIANT_MARKER: &str = ".config";

/// Directory under a preset that holds stored responses
pub const HISTORY_DIR_NAME: &str = ".history";

/// Variant used when the marker is missing or stale
pub const DEFAULT_VARIANT: &str = "default";

pub const DEFAULT_HTTP_METHOD: &str = "GET";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound accepted for `request.history_count`
pub const MAX_HISTORY_COUNT: i64 = 100;

/// Permission bits applied to every file we write
pub const FILE_MODE: u32 = 0o644;

/// Get the config root, checking environment variable first, then falling back to default
pub fn get_config_root() -> String {
    std::env::var_os(CONFIG_ROOT_ENV_VAR)
        .and_then(|val| val.into_string().ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_ROOT.to_string())
}

/// Config root with `~` expanded
pub fn config_root_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(&get_config_root()).into_owned())
}

/// Directory holding all presets
pub fn presets_dir() -> PathBuf {
    config_root_path().join(PRESETS_DIR_NAME)
}
