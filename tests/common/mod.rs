#![allow(dead_code)]

use anyhow::Result;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Scratch directory tree for one test
pub struct TestTree {
    pub temp_dir: TempDir,
}

impl TestTree {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a directory (and parents) under the tree
    pub fn dir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Write a file (creating parents) under the tree
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Set a file's modification time to `secs` after the epoch
pub fn set_mtime(path: &Path, secs: i64) -> Result<()> {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0))?;
    Ok(())
}

/// Move a file's modification time forward without touching its contents
pub fn touch(path: &Path) -> Result<()> {
    let current = fs::metadata(path)?.modified()?;
    let later = current + Duration::from_secs(60);
    filetime::set_file_mtime(path, FileTime::from_system_time(later))?;
    Ok(())
}

/// Modification time as reported by the filesystem
pub fn mtime(path: &Path) -> Result<SystemTime> {
    Ok(fs::metadata(path)?.modified()?)
}

/// Extractor treating every file as plain text, one page per file
pub fn plain_text(path: &Path) -> Result<Vec<String>> {
    Ok(vec![fs::read_to_string(path)?])
}

/// Paths relative to `root`, for readable assertions
pub fn relative(root: &Path, paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap_or(p)
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}
