use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::core::errors::Result;
use crate::core::models::request::output_dir;

/// A temporary file next to the final output path.
///
/// Tools write here; the file only becomes visible at the target path
/// through `commit`. Dropping a `StagedOutput` without committing deletes it,
/// so failed, timed-out and cancelled attempts leave nothing behind.
pub struct StagedOutput {
    path: TempPath,
    target: PathBuf,
}

impl StagedOutput {
    /// Create an empty staging file in the target's directory, so the final
    /// rename never crosses filesystems.
    pub fn create(target: &Path) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(".decrypt-pdf-")
            .suffix(".pdf")
            .tempfile_in(output_dir(target))?
            .into_temp_path();
        Ok(Self {
            path,
            target: target.to_path_buf(),
        })
    }

    /// Path the tool should write to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Give the staged file the permissions of `source`. Temporary files
    /// start out owner-only.
    pub fn copy_permissions_from(&self, source: &Path) -> Result<()> {
        let permissions = std::fs::metadata(source)?.permissions();
        std::fs::set_permissions(&self.path, permissions)?;
        Ok(())
    }

    /// Atomically move the staged file onto the target, replacing it.
    pub fn commit(self) -> Result<PathBuf> {
        self.path.persist(&self.target).map_err(|e| e.error)?;
        Ok(self.target)
    }
}
