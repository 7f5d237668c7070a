//! Change index for monitored directories.
//!
//! The [`ChangeIndex`] remembers, per file path, the modification time and
//! content hash seen at the last scan. [`ChangeIndex::update`] walks a
//! directory tree and reports every tracked file whose modification time
//! differs from the stored one.
//!
//! # Change detection
//!
//! A path whose stored modification time is exactly equal to the current one
//! is skipped without being read. Any other tracked path is read, hashed and
//! reported as changed, even if the new hash equals the stored one. Content
//! level deduplication is left to the router.
//!
//! Entries are never removed implicitly: a deleted file keeps its entry until
//! [`ChangeIndex::reset`] is called.

/// Include/exclude filtering on file base names
pub mod filter;

pub use filter::FileFilter;

use crate::pattern::PatternSet;
use crate::scanner::{DirectoryWalker, FsWalker, ListingPolicy};
use crate::utils::hash::ContentHash;
use crate::utils::serialization;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Last-known state of one tracked file. The path is the key in [`Index::entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Modification time observed when the file was last hashed
    pub mod_time: SystemTime,
    /// Hash of the file contents at that time
    pub hash: ContentHash,
}

/// Persisted state of a [`ChangeIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Tracked files by full path
    #[serde(with = "serialization::path_keys")]
    pub entries: BTreeMap<PathBuf, Entry>,
    /// Filter patterns; serialized as their source strings
    pub filter: FileFilter,
}

/// Incremental change detector over one or more directory trees.
pub struct ChangeIndex<W: DirectoryWalker = FsWalker> {
    /// Entries and filter
    index: Index,
    /// Source of directory listings
    walker: W,
    /// Reaction to a directory that cannot be listed
    policy: ListingPolicy,
}

impl ChangeIndex<FsWalker> {
    /// Create an empty index over the real filesystem.
    #[must_use]
    pub fn new(include: PatternSet, exclude: PatternSet) -> Self {
        Self::with_walker(FileFilter::new(include, exclude), FsWalker)
    }
}

impl<W: DirectoryWalker> ChangeIndex<W> {
    /// Listing failures abort [`update`](Self::update) unless overridden.
    pub const DEFAULT_POLICY: ListingPolicy = ListingPolicy::Abort;

    /// Create an empty index that lists directories through `walker`.
    #[must_use]
    pub fn with_walker(filter: FileFilter, walker: W) -> Self {
        Self {
            index: Index {
                entries: BTreeMap::new(),
                filter,
            },
            walker,
            policy: Self::DEFAULT_POLICY,
        }
    }

    /// Change how directory listing failures are handled.
    ///
    /// With [`ListingPolicy::SkipRoot`] the failure is logged and `update`
    /// returns what it found before the failing directory.
    #[must_use]
    pub const fn with_listing_policy(mut self, policy: ListingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Scan `root` recursively and return the changed paths, sorted and unique.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory under `root` cannot be listed and
    /// the policy is [`ListingPolicy::Abort`]. Unreadable files are logged
    /// and skipped.
    pub fn update(&mut self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut changed = BTreeSet::new();

        if let Err(e) = self.update_dir(root, &mut changed) {
            match self.policy {
                ListingPolicy::Abort => return Err(e),
                ListingPolicy::SkipRoot => {
                    warn!(root = %root.display(), error = %e, "could not scan");
                }
            }
        }

        Ok(sorted(changed))
    }

    /// Depth-first walk of one directory level, recursing into subdirectories.
    fn update_dir(&mut self, dir: &Path, changed: &mut BTreeSet<PathBuf>) -> Result<()> {
        let entries = self.walker.list(dir)?;

        for entry in entries {
            let path = entry.path_in(dir);
            if entry.is_dir {
                self.update_dir(&path, changed)?;
                continue;
            }

            if let Some(known) = self.index.entries.get(&path)
                && known.mod_time == entry.mod_time
            {
                continue;
            }
            if !self.index.filter.tracks(&path) {
                continue;
            }

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read");
                    continue;
                }
            };

            debug!(path = %path.display(), "changed");
            self.index.entries.insert(
                path.clone(),
                Entry {
                    mod_time: entry.mod_time,
                    hash: ContentHash::of(&bytes),
                },
            );
            changed.insert(path);
        }

        Ok(())
    }

    /// Write the entries and filter pattern strings to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn dump<S: Write>(&self, mut sink: S) -> Result<()> {
        let data = serialization::serialize(&self.index).context("Failed to serialize index")?;
        sink.write_all(&data).context("Failed to write index")?;
        sink.flush().context("Failed to flush index")?;
        Ok(())
    }

    /// Replace the current state with one read from `source`.
    ///
    /// Both the entries and the filter are taken from `source`; the filter
    /// patterns are recompiled. On error the current state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails, the blob is structurally invalid,
    /// or any persisted pattern no longer compiles.
    pub fn load<S: Read>(&mut self, mut source: S) -> Result<()> {
        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .context("Failed to read index")?;
        self.index = serialization::deserialize(&data).context("Failed to deserialize index")?;
        Ok(())
    }

    /// Dump the index to a file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut data = Vec::new();
        self.dump(&mut data)?;
        std::fs::write(path, &data)
            .with_context(|| format!("Failed to write index file: {}", path.display()))?;
        Ok(())
    }

    /// Load the index from a file written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or [`load`](Self::load) fails.
    pub fn restore(&mut self, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open index file: {}", path.display()))?;
        self.load(std::io::BufReader::new(file))
    }

    /// Stored state for `path`, if it has ever been tracked.
    #[must_use]
    pub fn entry(&self, path: &Path) -> Option<&Entry> {
        self.index.entries.get(path)
    }

    /// Number of tracked paths, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.entries.len()
    }

    /// True if nothing has been tracked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.entries.is_empty()
    }

    /// Active include/exclude filter.
    #[must_use]
    pub const fn filter(&self) -> &FileFilter {
        &self.index.filter
    }

    /// Forget every entry so the next update reports all tracked files again.
    pub fn reset(&mut self) {
        self.index.entries.clear();
    }
}

/// Sort paths by their raw string form.
pub(crate) fn sorted<I: IntoIterator<Item = PathBuf>>(paths: I) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = paths.into_iter().collect();
    out.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::DirEntry;
    use filetime::{FileTime, set_file_mtime};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn index() -> ChangeIndex {
        ChangeIndex::new(PatternSet::default(), PatternSet::default())
    }

    fn touch(path: &Path, secs: i64) -> Result<()> {
        set_file_mtime(path, FileTime::from_unix_time(secs, 0))?;
        Ok(())
    }

    #[test]
    fn test_update_reports_new_files_sorted() -> Result<()> {
        let dir = tempdir()?;
        std::fs::create_dir_all(dir.path().join("b"))?;
        std::fs::write(dir.path().join("b/one.txt"), "1")?;
        std::fs::write(dir.path().join("a-c.txt"), "2")?;
        std::fs::write(dir.path().join("z.txt"), "3")?;

        let mut idx = index();
        let changed = idx.update(dir.path())?;

        assert_eq!(
            changed,
            vec![
                dir.path().join("a-c.txt"),
                dir.path().join("b/one.txt"),
                dir.path().join("z.txt"),
            ]
        );
        assert_eq!(idx.len(), 3);
        Ok(())
    }

    #[test]
    fn test_update_twice_is_empty() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("a.txt"), "a")?;

        let mut idx = index();
        assert_eq!(idx.update(dir.path())?.len(), 1);
        assert!(idx.update(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_touch_without_content_change_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "same")?;
        touch(&file, 1_000)?;

        let mut idx = index();
        idx.update(dir.path())?;
        let before = *idx.entry(&file).unwrap();

        touch(&file, 2_000)?;
        assert_eq!(idx.update(dir.path())?, vec![file.clone()]);

        let after = *idx.entry(&file).unwrap();
        assert_eq!(before.hash, after.hash);
        assert_ne!(before.mod_time, after.mod_time);
        Ok(())
    }

    #[test]
    fn test_filter_applies_to_unknown_paths() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("keep.pdf"), "k")?;
        std::fs::write(dir.path().join("skip.tmp"), "s")?;
        std::fs::write(dir.path().join(".hidden.pdf"), "h")?;

        let mut idx = ChangeIndex::new(PatternSet::new([r"\.pdf$"])?, PatternSet::new([r"^\."])?);
        let changed = idx.update(dir.path())?;

        assert_eq!(changed, vec![dir.path().join("keep.pdf")]);
        assert_eq!(idx.len(), 1);
        Ok(())
    }

    #[test]
    fn test_dump_load_roundtrip_recovers_state() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("a.pdf"), "a")?;
        std::fs::write(dir.path().join("b.txt"), "b")?;

        let mut idx = ChangeIndex::new(PatternSet::new([r"\.pdf$"])?, PatternSet::default());
        idx.update(dir.path())?;

        let mut blob = Vec::new();
        idx.dump(&mut blob)?;

        let mut fresh = index();
        fresh.load(blob.as_slice())?;
        assert_eq!(fresh.filter(), idx.filter());
        assert!(fresh.update(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_rejects_garbage_and_keeps_state() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("a.txt"), "a")?;

        let mut idx = index();
        idx.update(dir.path())?;

        assert!(idx.load(&b"not an index"[..]).is_err());
        assert_eq!(idx.len(), 1);
        Ok(())
    }

    #[test]
    fn test_reset_reports_everything_again() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("a.txt"), "a")?;

        let mut idx = index();
        idx.update(dir.path())?;
        idx.reset();
        assert!(idx.is_empty());
        assert_eq!(idx.update(dir.path())?.len(), 1);
        Ok(())
    }

    /// Walker serving canned listings; directories missing from the map fail.
    struct FakeWalker {
        listings: HashMap<PathBuf, Vec<DirEntry>>,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl DirectoryWalker for FakeWalker {
        fn list(&self, path: &Path) -> Result<Vec<DirEntry>> {
            self.calls.borrow_mut().push(path.to_path_buf());
            self.listings
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("permission denied: {}", path.display()))
        }
    }

    fn dir_entry(name: &str, is_dir: bool) -> DirEntry {
        DirEntry {
            name: name.into(),
            is_dir,
            mod_time: SystemTime::UNIX_EPOCH,
            size: 0,
        }
    }

    #[test]
    fn test_unreadable_file_is_skipped() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("real.txt"), "r")?;

        let walker = FakeWalker {
            listings: HashMap::from([(
                dir.path().to_path_buf(),
                vec![dir_entry("ghost.txt", false), dir_entry("real.txt", false)],
            )]),
            calls: RefCell::default(),
        };
        let mut idx = ChangeIndex::with_walker(FileFilter::default(), walker);

        assert_eq!(idx.update(dir.path())?, vec![dir.path().join("real.txt")]);
        assert!(idx.entry(&dir.path().join("ghost.txt")).is_none());
        Ok(())
    }

    #[test]
    fn test_subdirectory_listing_failure_aborts() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("a.txt"), "a")?;

        let walker = FakeWalker {
            listings: HashMap::from([(
                dir.path().to_path_buf(),
                vec![dir_entry("a.txt", false), dir_entry("locked", true)],
            )]),
            calls: RefCell::default(),
        };
        let mut idx = ChangeIndex::with_walker(FileFilter::default(), walker);

        let err = idx.update(dir.path()).unwrap_err();
        assert!(err.to_string().contains("permission denied"));
        Ok(())
    }

    #[test]
    fn test_skip_policy_returns_partial_changes() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("a.txt"), "a")?;

        let walker = FakeWalker {
            listings: HashMap::from([(
                dir.path().to_path_buf(),
                vec![dir_entry("a.txt", false), dir_entry("locked", true)],
            )]),
            calls: RefCell::default(),
        };
        let mut idx = ChangeIndex::with_walker(FileFilter::default(), walker)
            .with_listing_policy(ListingPolicy::SkipRoot);

        assert_eq!(idx.update(dir.path())?, vec![dir.path().join("a.txt")]);
        assert_eq!(
            *idx.walker.calls.borrow(),
            vec![dir.path().to_path_buf(), dir.path().join("locked")]
        );
        Ok(())
    }
}
