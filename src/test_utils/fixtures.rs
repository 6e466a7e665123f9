//! Configuration files in temporary directories.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding configuration files.
///
/// The directory is removed when the fixture is dropped.
pub struct ConfigFixture {
    dir: TempDir,
}

impl ConfigFixture {
    /// Create an empty fixture directory.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("Failed to create fixture directory")?;
        Ok(Self { dir })
    }

    /// Root of the fixture.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `name` and return the file's URI.
    pub fn write(&self, name: &str, content: impl AsRef<[u8]>) -> Result<String> {
        let path = self.file(name);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write fixture {}", path.display()))?;
        Ok(path.to_string_lossy().into_owned())
    }

    /// Path of `name` inside the fixture, whether or not it exists.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
