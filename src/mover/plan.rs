//! Planned moves and their execution.
//!
//! Computing where files go and actually moving them are separate stages: a
//! dry run builds the same [`MovePlan`] and simply never calls
//! [`MovePlan::execute`].

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Why a single planned move did not happen.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Something is already present at the target path.
    #[error("moving {from:?} to {to:?}: declined as destination already exists")]
    DestinationExists {
        /// File that stayed in place
        from: PathBuf,
        /// Occupied target path
        to: PathBuf,
    },
    /// Checking the target or renaming failed.
    #[error("moving {from:?} to {to:?}: {source}")]
    Io {
        /// File that stayed in place
        from: PathBuf,
        /// Intended target path
        to: PathBuf,
        /// Underlying failure
        #[source]
        source: io::Error,
    },
}

/// Source files grouped by destination directory.
///
/// Destinations iterate in sorted order and each destination's sources are
/// kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovePlan {
    moves: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl MovePlan {
    /// Empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan moving `from` into the directory `to`.
    pub fn add(&mut self, to: &Path, from: PathBuf) {
        let files = self.moves.entry(to.to_path_buf()).or_default();
        files.push(from);
        sort_paths(files);
    }

    /// Append all of `other`'s moves, keeping every destination sorted.
    pub fn merge(&mut self, other: Self) {
        for (to, files) in other.moves {
            let dst = self.moves.entry(to).or_default();
            dst.extend(files);
            sort_paths(dst);
        }
    }

    /// Sources planned for destination `to`.
    #[must_use]
    pub fn get(&self, to: &Path) -> Option<&[PathBuf]> {
        self.moves.get(to).map(Vec::as_slice)
    }

    /// `(destination, sources)` pairs in destination order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[PathBuf])> {
        self.moves
            .iter()
            .map(|(to, files)| (to.as_path(), files.as_slice()))
    }

    /// True if nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Number of planned file moves across all destinations.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.moves.values().map(Vec::len).sum()
    }

    /// Target path of `from` inside `dir`.
    #[must_use]
    pub fn target(dir: &Path, from: &Path) -> PathBuf {
        match from.file_name() {
            Some(name) => dir.join(name),
            None => dir.to_path_buf(),
        }
    }

    /// Log every planned move without touching the filesystem.
    pub fn log(&self) {
        for (dir, files) in self.iter() {
            for from in files {
                info!(from = %from.display(), to = %Self::target(dir, from).display(), "planned move");
            }
        }
    }

    /// Rename every planned file into its destination.
    ///
    /// Each move is attempted independently; one failure does not stop the
    /// rest. A move whose target already exists is declined, never
    /// overwritten. Returns the failures in the order they happened.
    #[must_use]
    pub fn execute(&self) -> Vec<MoveError> {
        let mut failures = Vec::new();

        for (dir, files) in self.iter() {
            for from in files {
                let to = Self::target(dir, from);
                match move_file(from, &to) {
                    Ok(()) => info!(from = %from.display(), to = %to.display(), "moved"),
                    Err(e) => {
                        warn!(error = %e, "move failed");
                        failures.push(e);
                    }
                }
            }
        }

        failures
    }
}

fn move_file(from: &Path, to: &Path) -> Result<(), MoveError> {
    match std::fs::symlink_metadata(to) {
        Ok(_) => {
            return Err(MoveError::DestinationExists {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(MoveError::Io {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source,
            });
        }
    }

    std::fs::rename(from, to).map_err(|source| MoveError::Io {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}
