//! Variant layout: `variants/<name>/` directories plus the `.config` marker
//! naming the active one.

use super::{list_dirs, validate_name, DocumentKind, Workspace};
use crate::config::{ACTIVE_VARIANT_MARKER, DEFAULT_VARIANT};
use crate::error::{Error, Result};
use crate::store::{atomic_write, batch_rename, RenameOp};
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Why the marker could not be honored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    MissingMarker,
    EmptyMarker,
    UnknownVariant(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::MissingMarker => f.write_str("no active variant recorded"),
            FallbackReason::EmptyMarker => f.write_str("active variant marker is empty"),
            FallbackReason::UnknownVariant(name) => {
                write!(f, "active variant '{name}' has no directory")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantResolution {
    pub name: String,
    pub fallback: Option<FallbackReason>,
}

/// Pick the active variant from the marker contents and the variant
/// directories that exist. Anything unusable yields the default variant.
pub fn resolve_variant(marker: Option<&str>, available: &[String]) -> VariantResolution {
    let fallback = |reason| VariantResolution {
        name: DEFAULT_VARIANT.to_string(),
        fallback: Some(reason),
    };

    match marker.map(str::trim) {
        None => fallback(FallbackReason::MissingMarker),
        Some("") => fallback(FallbackReason::EmptyMarker),
        Some(name) if available.iter().any(|v| v == name) => VariantResolution {
            name: name.to_string(),
            fallback: None,
        },
        Some(name) => fallback(FallbackReason::UnknownVariant(name.to_string())),
    }
}

impl Workspace {
    pub fn marker_path(&self, preset: &str) -> PathBuf {
        self.preset_path(preset).join(ACTIVE_VARIANT_MARKER)
    }

    /// Variant names of the preset, sorted
    pub fn list_variants(&self, preset: &str) -> Result<Vec<String>> {
        list_dirs(&self.variants_dir(preset))
    }

    /// Name of the active variant. Never fails: an unreadable or stale marker
    /// is reported as a warning and the default variant is returned.
    pub fn active_variant(&self, preset: &str) -> String {
        let path = self.marker_path(preset);
        let marker = match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("cannot read {}: {}", path.display(), e);
                None
            }
        };

        let available = self.list_variants(preset).unwrap_or_else(|e| {
            tracing::warn!("cannot list variants of '{}': {}", preset, e);
            Vec::new()
        });

        let resolution = resolve_variant(marker.as_deref(), &available);
        if let Some(reason) = &resolution.fallback {
            tracing::warn!(
                "preset '{}': {}, using '{}'",
                preset,
                reason,
                resolution.name
            );
        }
        resolution.name
    }

    /// Record `variant` as active. The variant directory must already exist.
    pub fn set_active_variant(&self, preset: &str, variant: &str) -> Result<()> {
        if !self.variants_dir(preset).join(variant).is_dir() {
            return Err(Error::VariantNotFound {
                preset: preset.to_string(),
                variant: variant.to_string(),
            });
        }
        atomic_write(&self.marker_path(preset), variant.as_bytes())?;
        tracing::debug!("preset '{}' active variant is now '{}'", preset, variant);
        Ok(())
    }

    /// Create `variants/<variant>/`. The first variant of a preset takes over
    /// the documents at the preset root; later variants start empty.
    pub fn ensure_variant_structure(&self, preset: &str, variant: &str) -> Result<()> {
        if !self.preset_exists(preset) {
            return Err(Error::VariantPresetMissing(preset.to_string()));
        }
        validate_name(variant)?;

        let first_variant = !self.has_variants(preset);
        let variant_dir = self.variants_dir(preset).join(variant);
        fs::create_dir_all(&variant_dir)
            .map_err(|e| Error::io("create directory", &variant_dir, e))?;

        if first_variant {
            let root = self.preset_path(preset);
            let moves: Vec<RenameOp> = DocumentKind::ALL
                .iter()
                .map(|kind| kind.file_name())
                .filter(|name| root.join(name).is_file())
                .map(|name| RenameOp {
                    from: root.join(&name),
                    to: variant_dir.join(&name),
                })
                .collect();

            batch_rename(&moves)?;
            tracing::info!(
                "preset '{}' migrated {} document(s) into variant '{}'",
                preset,
                moves.len(),
                variant
            );
        }

        atomic_write(&self.marker_path(preset), variant.as_bytes())?;
        Ok(())
    }

    /// Create the variant if needed and make it active
    pub fn switch_variant(&self, preset: &str, variant: &str) -> Result<()> {
        self.ensure_variant_structure(preset, variant)?;
        self.set_active_variant(preset, variant)
    }

    /// Remove one variant. When the active variant goes, the first remaining
    /// one becomes active; when none remain the preset returns to the flat
    /// layout with no documents.
    pub fn delete_variant(&self, preset: &str, variant: &str) -> Result<()> {
        let dir = self.variants_dir(preset).join(variant);
        if !dir.is_dir() {
            return Err(Error::VariantNotFound {
                preset: preset.to_string(),
                variant: variant.to_string(),
            });
        }

        let was_active = self.active_variant(preset) == variant;
        fs::remove_dir_all(&dir).map_err(|e| Error::io("remove", &dir, e))?;
        tracing::info!("deleted variant '{}/{}'", preset, variant);

        let remaining = self.list_variants(preset)?;
        match remaining.first() {
            Some(next) if was_active => self.set_active_variant(preset, next)?,
            Some(_) => {}
            None => {
                let variants = self.variants_dir(preset);
                fs::remove_dir_all(&variants).map_err(|e| Error::io("remove", &variants, e))?;
                let marker = self.marker_path(preset);
                if marker.exists() {
                    fs::remove_file(&marker).map_err(|e| Error::io("remove", &marker, e))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace_with_preset(name: &str) -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path().join("presets"));
        ws.create_preset(name).unwrap();
        (dir, ws)
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_variant_uses_marker() {
        let resolution = resolve_variant(Some("staging\n"), &names(&["default", "staging"]));
        assert_eq!(resolution.name, "staging");
        assert_eq!(resolution.fallback, None);
    }

    #[test]
    fn test_resolve_variant_fallbacks() {
        let available = names(&["prod"]);

        let missing = resolve_variant(None, &available);
        assert_eq!(missing.name, DEFAULT_VARIANT);
        assert_eq!(missing.fallback, Some(FallbackReason::MissingMarker));

        let empty = resolve_variant(Some("  "), &available);
        assert_eq!(empty.fallback, Some(FallbackReason::EmptyMarker));

        let stale = resolve_variant(Some("gone"), &available);
        assert_eq!(stale.name, DEFAULT_VARIANT);
        assert_eq!(
            stale.fallback,
            Some(FallbackReason::UnknownVariant("gone".to_string()))
        );
    }

    #[test]
    fn test_first_variant_migrates_root_documents() {
        let (_dir, ws) = workspace_with_preset("api");
        let mut request = ws.load_document("api", DocumentKind::Request).unwrap();
        request.set("url", "https://example.com");
        request.write().unwrap();

        ws.ensure_variant_structure("api", "prod").unwrap();

        let root_file = ws.preset_path("api").join("request.toml");
        assert!(!root_file.exists());
        assert_eq!(ws.active_variant("api"), "prod");
        let migrated = ws.load_document("api", DocumentKind::Request).unwrap();
        assert_eq!(migrated.get_as_string("url"), "https://example.com");
    }

    #[test]
    fn test_second_variant_does_not_migrate_again() {
        let (_dir, ws) = workspace_with_preset("api");
        let mut body = ws.load_document("api", DocumentKind::Body).unwrap();
        body.set("name", "first");
        body.write().unwrap();
        ws.ensure_variant_structure("api", "one").unwrap();

        // A stray root document appearing later stays where it is
        fs::write(ws.preset_path("api").join("body.toml"), "name = \"stray\"\n").unwrap();
        ws.ensure_variant_structure("api", "two").unwrap();

        let one = ws.variants_dir("api").join("one").join("body.toml");
        assert_eq!(fs::read_to_string(one).unwrap(), "name = \"first\"\n");
        assert!(!ws.variants_dir("api").join("two").join("body.toml").exists());
        assert!(ws.preset_path("api").join("body.toml").exists());
        assert_eq!(ws.list_variants("api").unwrap(), names(&["one", "two"]));
    }

    #[test]
    fn test_variant_requires_base_preset() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let err = ws.ensure_variant_structure("ghost", "prod").unwrap_err();
        assert!(matches!(err, Error::VariantPresetMissing(name) if name == "ghost"));
    }

    #[test]
    fn test_set_active_variant_requires_directory() {
        let (_dir, ws) = workspace_with_preset("api");
        ws.ensure_variant_structure("api", "prod").unwrap();

        let err = ws.set_active_variant("api", "staging").unwrap_err();
        assert!(matches!(err, Error::VariantNotFound { .. }));
        assert_eq!(ws.active_variant("api"), "prod");
    }

    #[test]
    fn test_switch_variant_documents_are_independent() {
        let (_dir, ws) = workspace_with_preset("api");

        ws.switch_variant("api", "prod").unwrap();
        let mut doc = ws.load_document("api", DocumentKind::Headers).unwrap();
        doc.set("X-Env", "prod");
        doc.write().unwrap();

        ws.switch_variant("api", "dev").unwrap();
        let dev = ws.load_document("api", DocumentKind::Headers).unwrap();
        assert!(dev.is_empty());

        ws.switch_variant("api", "prod").unwrap();
        let prod = ws.load_document("api", DocumentKind::Headers).unwrap();
        assert_eq!(prod.get_as_string("X-Env"), "prod");
    }

    #[test]
    fn test_stale_marker_falls_back_to_default() {
        let (_dir, ws) = workspace_with_preset("api");
        ws.switch_variant("api", "prod").unwrap();
        fs::write(ws.marker_path("api"), "deleted").unwrap();

        assert_eq!(ws.active_variant("api"), DEFAULT_VARIANT);
    }

    #[test]
    fn test_delete_active_variant_activates_next() {
        let (_dir, ws) = workspace_with_preset("api");
        ws.switch_variant("api", "b").unwrap();
        ws.switch_variant("api", "c").unwrap();
        ws.switch_variant("api", "a").unwrap();

        ws.delete_variant("api", "a").unwrap();
        assert_eq!(ws.active_variant("api"), "b");

        ws.delete_variant("api", "c").unwrap();
        assert_eq!(ws.active_variant("api"), "b");

        ws.delete_variant("api", "b").unwrap();
        assert!(!ws.has_variants("api"));
        assert!(!ws.marker_path("api").exists());
        assert!(ws.delete_variant("api", "b").is_err());
    }
}
