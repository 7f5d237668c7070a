//! Include/exclude filtering on file base names.

use crate::pattern::PatternSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decides which files the change index tracks.
///
/// Exclusion wins over inclusion. An empty include list tracks everything
/// that is not excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    /// A file must match one of these (when non-empty)
    pub include: PatternSet,
    /// A file matching any of these is never tracked
    pub exclude: PatternSet,
}

impl FileFilter {
    /// Filter from already compiled pattern sets.
    #[must_use]
    pub const fn new(include: PatternSet, exclude: PatternSet) -> Self {
        Self { include, exclude }
    }

    /// Whether `path` passes the filter. Only the final component is matched.
    #[must_use]
    pub fn tracks(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.exclude.matches_any(&name) {
            return false;
        }
        self.include.is_empty() || self.include.matches_any(&name)
    }
}
