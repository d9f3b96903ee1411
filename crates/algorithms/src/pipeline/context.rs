//! Scratch space for intermediate pipeline products.

use std::path::{Path, PathBuf};

use bivargis_core::Result;
use tempfile::TempDir;

/// Per-run scratch directory for intermediate rasters.
///
/// Aligned and rescaled intermediates are written here; the directory
/// and its contents are removed when the context is dropped.
#[derive(Debug)]
pub struct RunContext {
    dir: TempDir,
}

impl RunContext {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("bivar_").tempdir()?;
        Ok(Self { dir })
    }

    /// Path of an intermediate file inside the scratch directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_directory_is_removed_on_drop() {
        let ctx = RunContext::new().unwrap();
        let dir = ctx.dir().to_path_buf();
        std::fs::write(ctx.path("intermediate.tif"), b"x").unwrap();
        assert!(dir.exists());

        drop(ctx);
        assert!(!dir.exists());
    }
}
