use std::path::Path;
use tempfile::TempDir;

use crate::error::Result;

/// Temporary download directory, removed when dropped.
///
/// Removal happens on every exit path of the owning scope, including early
/// returns through `?`. Failures to remove are logged and otherwise ignored.
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Create a fresh directory under `root`, or the system temp dir
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("nbget-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        tracing::debug!("Created temporary directory {}", dir.path().display());

        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| Path::new(""))
    }

    /// Remove the directory now. Calling this more than once is harmless.
    pub fn close(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        let path = dir.path().to_path_buf();
        if !path.exists() {
            tracing::debug!("{} already removed", path.display());
            return;
        }

        tracing::info!("Removing {}", path.display());
        if let Err(e) = dir.close() {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.close();
    }
}
