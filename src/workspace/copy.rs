//! Copying presets and variants.
//!
//! A preset copied to a new preset takes everything with it: variants, the
//! active variant marker and the response history. Every other direction
//! copies the five documents only, read from the source variant (or the
//! source preset's current document directory) and mirrored into the
//! destination, which becomes the active variant when it is one.

use super::{DocumentKind, PresetRef, Workspace};
use crate::error::{Error, Result};
use crate::store::atomic_write;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

impl Workspace {
    pub fn copy(&self, source: &PresetRef, dest: &PresetRef) -> Result<()> {
        if !self.preset_exists(&source.preset) {
            return Err(Error::PresetNotFound(source.preset.clone()));
        }
        let from = self.source_dir(source)?;

        match &dest.variant {
            None => {
                if self.preset_exists(&dest.preset) {
                    return Err(Error::PresetExists(dest.preset.clone()));
                }
                if source.variant.is_none() {
                    return self.copy_whole_preset(&source.preset, &dest.preset);
                }
                let documents = read_documents(&from)?;
                let to = self.create_preset(&dest.preset)?;
                write_documents(&to, &documents)?;
            }
            Some(variant) => {
                let to = self.variants_dir(&dest.preset).join(variant);
                if from == to {
                    return Err(Error::CopyOntoItself(dest.to_string()));
                }
                // Read first: making the first variant moves the root documents
                let documents = read_documents(&from)?;
                self.create_preset(&dest.preset)?;
                self.ensure_variant_structure(&dest.preset, variant)?;
                write_documents(&to, &documents)?;
            }
        }

        tracing::info!("copied '{}' to '{}'", source, dest);
        Ok(())
    }

    fn source_dir(&self, source: &PresetRef) -> Result<PathBuf> {
        match &source.variant {
            Some(variant) => {
                let dir = self.variants_dir(&source.preset).join(variant);
                if !dir.is_dir() {
                    return Err(Error::VariantNotFound {
                        preset: source.preset.clone(),
                        variant: variant.clone(),
                    });
                }
                Ok(dir)
            }
            None => Ok(self.document_dir(&source.preset)),
        }
    }

    fn copy_whole_preset(&self, source: &str, dest: &str) -> Result<()> {
        super::validate_name(dest)?;
        let to = self.preset_path(dest);
        if let Err(e) = copy_dir(&self.preset_path(source), &to) {
            if let Err(cleanup) = fs::remove_dir_all(&to) {
                tracing::warn!("cannot remove partial copy {}: {}", to.display(), cleanup);
            }
            return Err(e);
        }
        tracing::info!("copied '{}' to '{}'", source, dest);
        Ok(())
    }
}

/// Contents of the documents present in `dir`
fn read_documents(dir: &Path) -> Result<Vec<(DocumentKind, Option<Vec<u8>>)>> {
    DocumentKind::ALL
        .into_iter()
        .map(|kind| {
            let path = dir.join(kind.file_name());
            match fs::read(&path) {
                Ok(bytes) => Ok((kind, Some(bytes))),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok((kind, None)),
                Err(e) => Err(Error::io("read", &path, e)),
            }
        })
        .collect()
}

/// Make `dir` hold exactly the given documents
fn write_documents(dir: &Path, documents: &[(DocumentKind, Option<Vec<u8>>)]) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::io("create directory", dir, e))?;
    for (kind, bytes) in documents {
        let path = dir.join(kind.file_name());
        match bytes {
            Some(bytes) => atomic_write(&path, bytes)?,
            None if path.is_file() => {
                fs::remove_file(&path).map_err(|e| Error::io("remove", &path, e))?
            }
            None => {}
        }
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| Error::io("create directory", to, e))?;
    let entries = fs::read_dir(from).map_err(|e| Error::io("read directory", from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("read directory", from, e))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copy_dir(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(|e| Error::io("copy", &source, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryEntry;
    use tempfile::TempDir;

    fn preset(text: &str) -> PresetRef {
        PresetRef::parse(text).unwrap()
    }

    fn workspace() -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path().join("presets"));
        (dir, ws)
    }

    fn set_url(ws: &Workspace, name: &str, url: &str) {
        let mut request = ws.load_document(name, DocumentKind::Request).unwrap();
        request.set("url", url);
        request.write().unwrap();
    }

    fn url(ws: &Workspace, name: &str) -> String {
        ws.load_document(name, DocumentKind::Request)
            .unwrap()
            .get_as_string("url")
    }

    #[test]
    fn test_preset_to_preset_takes_variants_and_history() {
        let (_dir, ws) = workspace();
        ws.create_preset("api").unwrap();
        ws.switch_variant("api", "prod").unwrap();
        set_url(&ws, "api", "https://prod");
        let entry = HistoryEntry::new("GET", "https://prod", "200 OK", "1ms", &[], "");
        ws.history("api").store(&entry, 5).unwrap();

        ws.copy(&preset("api"), &preset("api2")).unwrap();

        assert_eq!(ws.list_variants("api2").unwrap(), vec!["prod"]);
        assert_eq!(ws.active_variant("api2"), "prod");
        assert_eq!(url(&ws, "api2"), "https://prod");
        assert_eq!(ws.history("api2").count().unwrap(), 1);
        // The source is untouched
        assert_eq!(url(&ws, "api"), "https://prod");

        assert!(matches!(
            ws.copy(&preset("api"), &preset("api2")),
            Err(Error::PresetExists(_))
        ));
    }

    #[test]
    fn test_preset_to_variant_of_same_preset() {
        let (_dir, ws) = workspace();
        ws.create_preset("api").unwrap();
        set_url(&ws, "api", "https://flat");

        ws.copy(&preset("api"), &preset("api/staging")).unwrap();

        // Making the first variant moved the root documents into it
        assert_eq!(ws.list_variants("api").unwrap(), vec!["staging"]);
        assert_eq!(ws.active_variant("api"), "staging");
        assert_eq!(url(&ws, "api"), "https://flat");
        assert!(!ws.preset_path("api").join("request.toml").exists());
    }

    #[test]
    fn test_preset_to_variant_creates_destination() {
        let (_dir, ws) = workspace();
        ws.create_preset("api").unwrap();
        set_url(&ws, "api", "https://api");

        ws.copy(&preset("api"), &preset("mirror/dev")).unwrap();
        assert_eq!(ws.active_variant("mirror"), "dev");
        assert_eq!(url(&ws, "mirror"), "https://api");
    }

    #[test]
    fn test_variant_to_preset() {
        let (_dir, ws) = workspace();
        ws.create_preset("api").unwrap();
        ws.switch_variant("api", "prod").unwrap();
        set_url(&ws, "api", "https://prod");
        ws.switch_variant("api", "dev").unwrap();

        ws.copy(&preset("api/prod"), &preset("prod-only")).unwrap();

        assert!(!ws.has_variants("prod-only"));
        assert_eq!(url(&ws, "prod-only"), "https://prod");
        assert_eq!(ws.history("prod-only").count().unwrap(), 0);

        assert!(matches!(
            ws.copy(&preset("api/ghost"), &preset("other")),
            Err(Error::VariantNotFound { .. })
        ));
    }

    #[test]
    fn test_variant_to_variant_mirrors_documents() {
        let (_dir, ws) = workspace();
        ws.create_preset("api").unwrap();
        ws.switch_variant("api", "prod").unwrap();
        set_url(&ws, "api", "https://prod");
        ws.switch_variant("api", "dev").unwrap();
        set_url(&ws, "api", "https://dev");
        let mut headers = ws.load_document("api", DocumentKind::Headers).unwrap();
        headers.set("X-Debug", "1");
        headers.write().unwrap();

        ws.copy(&preset("api/prod"), &preset("api/dev")).unwrap();

        assert_eq!(ws.active_variant("api"), "dev");
        assert_eq!(url(&ws, "api"), "https://prod");
        assert!(!ws.document_path("api", DocumentKind::Headers).exists());

        assert!(matches!(
            ws.copy(&preset("api/dev"), &preset("api/dev")),
            Err(Error::CopyOntoItself(_))
        ));
    }

    #[test]
    fn test_copy_from_missing_preset() {
        let (_dir, ws) = workspace();
        assert!(matches!(
            ws.copy(&preset("ghost"), &preset("copy")),
            Err(Error::PresetNotFound(_))
        ));
        assert!(!ws.preset_exists("copy"));
    }
}
