//! Remote object storage.
//!
//! Blobs are opaque byte strings addressed by `/`-separated names. The only
//! backend shipped here is [`LocalStore`], which keeps each blob as a file
//! under a root directory (a mounted backup drive, a synced folder).

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Minimal interface to an object store.
pub trait BlobStore {
    /// Store `contents` under `name`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn upload(&self, name: &str, contents: &[u8]) -> Result<()>;

    /// Fetch the blob stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no such blob exists or it cannot be read.
    fn download(&self, name: &str) -> Result<Vec<u8>>;

    /// Names of all blobs starting with `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// [`BlobStore`] backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Store rooted at `root`; the directory is created on first upload.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a blob name onto a path under the root, refusing escapes.
    fn blob_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        let mut normal = relative.components().peekable();
        if normal.peek().is_none()
            || !normal.all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            anyhow::bail!("Invalid blob name: {name:?}");
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalStore {
    fn upload(&self, name: &str, contents: &[u8]) -> Result<()> {
        let path = self.blob_path(name)?;
        let parent = path.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
        tmp.write_all(contents)
            .with_context(|| format!("Failed to write blob {name:?}"))?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to store blob at {}", path.display()))?;
        Ok(())
    }

    fn download(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(name)?;
        std::fs::read(&path).with_context(|| format!("Failed to read blob: {}", path.display()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.with_context(|| {
                format!("Failed to read directory entry in {}", self.root.display())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if name.starts_with(prefix) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}
