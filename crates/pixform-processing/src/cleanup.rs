//! Best-effort removal of uploaded temporary files

use std::path::{Path, PathBuf};

/// Delete a file, logging instead of failing.
///
/// A missing file is logged like any other error; the caller's result is never affected.
pub fn cleanup(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed temporary file");
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to cleanup file"
            );
        }
    }
}

/// Owning handle over an uploaded file.
///
/// The file is removed through [`cleanup`] exactly once, when the handle is dropped.
/// Dropping unlinks synchronously on the current thread; async callers use
/// [`TempFile::release`].
/// Transform services take it by value, so whichever path they exit through
/// (success, validation error, codec error, panic) releases the file.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file from async code without blocking the runtime worker.
    ///
    /// The unlink runs on the blocking pool and has finished when this returns.
    pub async fn release(self) {
        if let Err(e) = tokio::task::spawn_blocking(move || drop(self)).await {
            tracing::warn!(error = %e, "Cleanup task failed");
        }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        cleanup(&self.path);
    }
}
