//! Single-level directory listing.
//!
//! Both engines recurse on their own; a [`DirectoryWalker`] only ever reports
//! the immediate children of one directory. This keeps the recursion (and the
//! decision of what to do when a listing fails) inside each engine.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name without any directory component, as the OS reported it
    pub name: OsString,
    /// Whether the entry is a directory (symlinks are not followed)
    pub is_dir: bool,
    /// Last modification time as reported by the filesystem
    pub mod_time: SystemTime,
    /// Size in bytes
    pub size: u64,
}

impl DirEntry {
    /// Full path of this entry under `parent`.
    #[must_use]
    pub fn path_in(&self, parent: &Path) -> PathBuf {
        parent.join(&self.name)
    }
}

/// Lists the entries of a single directory level.
pub trait DirectoryWalker {
    /// Return the children of `path`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a readable directory or any child
    /// cannot be stat'ed.
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>>;
}

/// What an engine does when a directory cannot be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingPolicy {
    /// Fail the whole call with the listing error.
    Abort,
    /// Log the failure and continue without the affected root.
    SkipRoot,
}

/// [`DirectoryWalker`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsWalker;

impl DirectoryWalker for FsWalker {
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat directory: {}", path.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("Not a directory: {}", path.display());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry =
                entry.with_context(|| format!("Failed to list directory: {}", path.display()))?;
            let metadata = entry
                .metadata()
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
            let mod_time = metadata
                .modified()
                .with_context(|| format!("No modification time for {}", entry.path().display()))?;

            entries.push(DirEntry {
                name: entry.file_name().to_os_string(),
                is_dir: metadata.is_dir(),
                mod_time,
                size: metadata.len(),
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_single_level() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("b.pdf"), "bb")?;
        std::fs::write(dir.path().join("a.txt"), "a")?;
        std::fs::create_dir(dir.path().join("sub"))?;
        std::fs::write(dir.path().join("sub/nested.txt"), "nested")?;

        let entries = FsWalker.list(dir.path())?;
        let names: Vec<_> = entries.iter().map(|e| e.name.to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.txt", "b.pdf", "sub"]);

        assert!(!entries[0].is_dir);
        assert_eq!(entries[1].size, 2);
        assert!(entries[2].is_dir);
        assert_eq!(entries[2].path_in(dir.path()), dir.path().join("sub"));

        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_list_keeps_non_utf8_names() -> Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir()?;
        let raw = OsStr::from_bytes(b"caf\xff.pdf");
        std::fs::write(dir.path().join(raw), "x")?;

        let entries = FsWalker.list(dir.path())?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name.as_os_str(), raw);
        assert!(entries[0].path_in(dir.path()).exists());
        Ok(())
    }

    #[test]
    fn test_list_missing_directory_fails() {
        let dir = tempdir().unwrap();
        assert!(FsWalker.list(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_list_regular_file_fails() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x")?;
        assert!(FsWalker.list(&file).is_err());
        Ok(())
    }
}
