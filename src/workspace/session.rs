//! Per-terminal session: which preset commands apply to when none is named.
//!
//! Stored as `<config-root>/.session_<terminal-id>` holding the preset name.
//! Loaded once per invocation and written back only when it changed.

use super::{base_name, validate_name, PresetRef};
use crate::error::{Error, Result};
use crate::store::atomic_write;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SESSION_FILE_PREFIX: &str = ".session_";
const DEFAULT_TERMINAL_ID: &str = "default";

#[derive(Debug, Clone)]
pub struct Session {
    file: PathBuf,
    current: Option<String>,
    dirty: bool,
}

impl Session {
    /// Load the session for `terminal_id`. A missing or unreadable file is an
    /// empty session.
    pub fn load(config_root: &Path, terminal_id: &str) -> Self {
        let file = config_root.join(format!("{SESSION_FILE_PREFIX}{terminal_id}"));
        let current = match fs::read_to_string(&file) {
            Ok(text) => Some(text.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("ignoring unreadable session {}: {}", file.display(), e);
                None
            }
        };

        Self {
            file,
            current,
            dirty: false,
        }
    }

    /// Filename-safe terminal identifier from a `TTY`-style value
    /// (`/dev/pts/3` becomes `3`); `default` when unset
    pub fn terminal_id_from(tty: Option<&str>) -> String {
        tty.map(str::trim)
            .filter(|t| !t.is_empty())
            .and_then(|t| Path::new(t).file_name())
            .map(|name| name.to_string_lossy().replace(['/', '\\'], "_"))
            .unwrap_or_else(|| DEFAULT_TERMINAL_ID.to_string())
    }

    pub fn file_path(&self) -> &Path {
        &self.file
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn set_current(&mut self, preset: &str) -> Result<()> {
        let name = base_name(preset);
        validate_name(name)?;
        if self.current.as_deref() != Some(name) {
            self.current = Some(name.to_string());
            self.dirty = true;
        }
        Ok(())
    }

    /// Forget the current preset if it is `preset`
    pub fn clear_if(&mut self, preset: &str) {
        if self.current.as_deref() == Some(base_name(preset)) {
            self.current = None;
            self.dirty = true;
        }
    }

    /// Persist the session if anything changed since `load`
    pub fn save_if_changed(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
        }
        let content = self.current.as_deref().unwrap_or_default();
        atomic_write(&self.file, content.as_bytes())?;
        self.dirty = false;
        tracing::debug!("saved session to {}", self.file.display());
        Ok(true)
    }

    /// Resolve a preset argument: `None` is the current preset, `/variant`
    /// is a variant of the current preset, anything else is parsed as given.
    pub fn resolve(&self, arg: Option<&str>) -> Result<PresetRef> {
        match arg {
            None => {
                let current = self.current.as_deref().ok_or(Error::NoActivePreset)?;
                PresetRef::parse(current)
            }
            Some(arg) => match arg.strip_prefix('/') {
                Some(variant) => {
                    let current = self.current.as_deref().ok_or(Error::NoActivePreset)?;
                    validate_name(variant)?;
                    Ok(PresetRef {
                        preset: current.to_string(),
                        variant: Some(variant.to_string()),
                    })
                }
                None => PresetRef::parse(arg),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_session() {
        let dir = TempDir::new().unwrap();
        let session = Session::load(dir.path(), "default");
        assert_eq!(session.current(), None);
        assert!(matches!(session.resolve(None), Err(Error::NoActivePreset)));
        assert!(matches!(
            session.resolve(Some("/prod")),
            Err(Error::NoActivePreset)
        ));
    }

    #[test]
    fn test_save_only_when_changed() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load(dir.path(), "7");
        assert!(!session.save_if_changed().unwrap());
        assert!(!session.file_path().exists());

        session.set_current("api/prod").unwrap();
        assert!(session.save_if_changed().unwrap());
        assert_eq!(fs::read_to_string(dir.path().join(".session_7")).unwrap(), "api");

        session.set_current("api").unwrap();
        assert!(!session.save_if_changed().unwrap());

        let reloaded = Session::load(dir.path(), "7");
        assert_eq!(reloaded.current(), Some("api"));
    }

    #[test]
    fn test_sessions_are_per_terminal() {
        let dir = TempDir::new().unwrap();
        let mut one = Session::load(dir.path(), "1");
        one.set_current("alpha").unwrap();
        one.save_if_changed().unwrap();

        let two = Session::load(dir.path(), "2");
        assert_eq!(two.current(), None);
    }

    #[test]
    fn test_resolve_forms() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load(dir.path(), "default");
        session.set_current("api").unwrap();

        assert_eq!(session.resolve(None).unwrap().to_string(), "api");
        assert_eq!(
            session.resolve(Some("/staging")).unwrap().to_string(),
            "api/staging"
        );
        assert_eq!(
            session.resolve(Some("other/dev")).unwrap().to_string(),
            "other/dev"
        );
        assert!(session.resolve(Some("/")).is_err());
    }

    #[test]
    fn test_clear_if() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load(dir.path(), "default");
        session.set_current("api").unwrap();
        session.clear_if("other");
        assert_eq!(session.current(), Some("api"));
        session.clear_if("api");
        assert_eq!(session.current(), None);
    }

    #[test]
    fn test_terminal_id_from() {
        assert_eq!(Session::terminal_id_from(Some("/dev/pts/3")), "3");
        assert_eq!(Session::terminal_id_from(Some("ttys001")), "ttys001");
        assert_eq!(Session::terminal_id_from(Some("")), "default");
        assert_eq!(Session::terminal_id_from(None), "default");
    }
}
