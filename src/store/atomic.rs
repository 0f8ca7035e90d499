//! Atomic file replacement and all-or-nothing rename batches.
//!
//! Writes go to a temp file in the target's directory, are flushed and synced,
//! and only then renamed over the target, so readers see either the old file
//! or the new one and never a truncated one.

use crate::config::FILE_MODE;
use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A fully written temp file waiting to replace its target
pub struct StagedWrite {
    target: PathBuf,
    temp: NamedTempFile,
}

impl StagedWrite {
    /// Write `data` to a temp file next to `target`. The target is not touched.
    pub fn new(target: &Path, data: &[u8]) -> Result<Self> {
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::Builder::new()
            .prefix(".bluepreset-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::io("create temp file in", dir, e))?;

        temp.write_all(data)
            .map_err(|e| Error::io("write temp file for", target, e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::io("sync temp file for", target, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(FILE_MODE))
                .map_err(|e| Error::io("set permissions on", temp.path(), e))?;
        }

        Ok(Self {
            target: target.to_path_buf(),
            temp,
        })
    }

    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the temp file over the target
    pub fn commit(self) -> Result<()> {
        let StagedWrite { target, temp } = self;
        temp.persist(&target)
            .map_err(|e| Error::io("replace", &target, e.error))?;
        Ok(())
    }
}

/// Write `data` to `target` atomically
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    StagedWrite::new(target, data)?.commit()
}

/// One step of a rename batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOp {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Apply renames in order. If one fails, every rename already done is
/// reversed (newest first) before the error is returned.
pub fn batch_rename(ops: &[RenameOp]) -> Result<()> {
    let mut completed: Vec<&RenameOp> = Vec::with_capacity(ops.len());

    for op in ops {
        if let Err(source) = fs::rename(&op.from, &op.to) {
            rollback(&completed);
            return Err(Error::io("rename", &op.from, source));
        }
        completed.push(op);
    }

    Ok(())
}

fn rollback(completed: &[&RenameOp]) {
    for op in completed.iter().rev() {
        if let Err(e) = fs::rename(&op.to, &op.from) {
            tracing::warn!(
                "rollback of {} -> {} failed: {}",
                op.from.display(),
                op.to.display(),
                e
            );
        }
    }
}
