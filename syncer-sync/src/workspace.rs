//! Scratch directory for one push or pull run.

use std::path::{Path, PathBuf};

use syncer_core::SCRATCH_PREFIX;
use tempfile::TempDir;

use crate::error::SyncError;

/// Exclusively owned temporary directory under the system temp root.
///
/// [`close`](Self::close) removes it and reports failures. Dropping without
/// closing removes it too, so every return path cleans up.
#[derive(Debug)]
pub struct ScratchWorkspace {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl ScratchWorkspace {
    /// Create `<tmp>/file-syncer-XXXXXX`.
    pub fn create() -> Result<Self, SyncError> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(SyncError::Workspace)?;
        tracing::debug!(path = %dir.path().display(), "scratch workspace created");
        Ok(Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now. A failed removal is logged, not returned.
    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        tracing::debug!(path = %self.path.display(), "removing scratch workspace");
        if let Err(err) = dir.close() {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove scratch workspace"
            );
        }
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        self.remove();
    }
}
