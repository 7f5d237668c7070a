//! Content-based routing of documents into destination directories.
//!
//! A [`ContentRouter`] walks its source directories, extracts the text of
//! every supported document it has not seen before, and plans a move to the
//! destination of the first [`Rule`] whose patterns all match that text.
//!
//! # Deduplication
//!
//! The router remembers the modification time and sha-256 digest of every file
//! it examined during the life of the process. A file with an unchanged
//! modification time is skipped outright; a file whose time changed but whose
//! digest did not (a bare `touch`) has its stored time refreshed and is also
//! skipped, so text is only extracted from genuinely new content.

/// Text extraction collaborators
pub mod extract;
/// Planned moves and their execution
pub mod plan;
/// Ordered pattern rules
pub mod rules;

pub use extract::{PdfToText, TextExtractor};
pub use plan::{MoveError, MovePlan};
pub use rules::Rule;

use crate::scanner::{DirectoryWalker, FsWalker, ListingPolicy};
use crate::utils::hash::file_digest_hex;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// File extensions the router extracts text from.
///
/// Compared case-insensitively against [`Path::extension`], so `scan.PDF`
/// qualifies while a file named just `.pdf` (no stem) does not.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf"];

/// Whether `name` carries one of [`SUPPORTED_EXTENSIONS`].
#[must_use]
pub fn is_supported(name: impl AsRef<Path>) -> bool {
    name.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// What the router last observed for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SeenRecord {
    modified: SystemTime,
    digest: String,
}

/// Result of one [`ContentRouter::scan`].
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Every move the scan planned, executed or not
    pub plan: MovePlan,
    /// Moves that were attempted and failed
    pub failures: Vec<MoveError>,
}

impl ScanOutcome {
    /// The plan, or the first move failure if any move failed.
    ///
    /// # Errors
    ///
    /// Returns the first [`MoveError`] recorded during execution.
    pub fn into_result(self) -> Result<MovePlan, MoveError> {
        match self.failures.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.plan),
        }
    }
}

/// Routes documents from source directories according to ordered rules.
pub struct ContentRouter<E: TextExtractor = PdfToText, W: DirectoryWalker = FsWalker> {
    /// Roots scanned in order
    sources: Vec<PathBuf>,
    /// Rules in declaration order; first full match wins
    rules: Vec<Rule>,
    extractor: E,
    walker: W,
    /// Process-lifetime dedup cache, keyed by full path
    seen: HashMap<PathBuf, SeenRecord>,
    /// Reaction to a root that cannot be walked
    policy: ListingPolicy,
}

impl<E: TextExtractor> ContentRouter<E, FsWalker> {
    /// Router over the real filesystem.
    #[must_use]
    pub fn new(sources: Vec<PathBuf>, rules: Vec<Rule>, extractor: E) -> Self {
        Self::with_walker(sources, rules, extractor, FsWalker)
    }
}

impl<E: TextExtractor, W: DirectoryWalker> ContentRouter<E, W> {
    /// A root that fails to walk is logged and skipped unless overridden.
    pub const DEFAULT_POLICY: ListingPolicy = ListingPolicy::SkipRoot;

    /// Router listing directories through `walker`.
    #[must_use]
    pub fn with_walker(sources: Vec<PathBuf>, rules: Vec<Rule>, extractor: E, walker: W) -> Self {
        Self {
            sources,
            rules,
            extractor,
            walker,
            seen: HashMap::new(),
            policy: Self::DEFAULT_POLICY,
        }
    }

    /// Change how a failing source root is handled.
    ///
    /// With [`ListingPolicy::Abort`] the first root that cannot be walked
    /// fails [`plan`](Self::plan) and [`scan`](Self::scan).
    #[must_use]
    pub fn with_listing_policy(mut self, policy: ListingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Walk every source root and plan moves for newly seen matching files.
    ///
    /// Roots are processed one after another. Under the default policy a root
    /// that fails anywhere in its walk contributes nothing and the others are
    /// still processed.
    ///
    /// # Errors
    ///
    /// Returns an error only when the policy is [`ListingPolicy::Abort`] and
    /// a root fails.
    pub fn plan(&mut self) -> Result<MovePlan> {
        let mut plan = MovePlan::new();

        for root in self.sources.clone() {
            let mut local = MovePlan::new();
            match self.scan_dir(&root, &mut local) {
                Ok(()) => plan.merge(local),
                Err(e) => match self.policy {
                    ListingPolicy::SkipRoot => {
                        warn!(root = %root.display(), error = %e, "could not scan");
                    }
                    ListingPolicy::Abort => {
                        return Err(e.context(format!("Failed to scan {}", root.display())));
                    }
                },
            }
        }

        Ok(plan)
    }

    /// Plan moves and, unless `dry_run`, execute them.
    ///
    /// Every planned move is attempted even if earlier ones fail; failures
    /// are collected in the returned [`ScanOutcome`].
    ///
    /// # Errors
    ///
    /// Returns an error if [`plan`](Self::plan) fails.
    pub fn scan(&mut self, dry_run: bool) -> Result<ScanOutcome> {
        let plan = self.plan()?;
        let failures = if dry_run {
            plan.log();
            Vec::new()
        } else {
            plan.execute()
        };
        Ok(ScanOutcome { plan, failures })
    }

    fn scan_dir(&mut self, dir: &Path, plan: &mut MovePlan) -> Result<()> {
        let entries = self.walker.list(dir)?;

        for entry in entries {
            let path = entry.path_in(dir);
            if entry.is_dir {
                self.scan_dir(&path, plan)?;
                continue;
            }
            if !is_supported(&entry.name) {
                continue;
            }
            if self.already_seen(&path, entry.mod_time)? {
                continue;
            }
            if let Some(to) = self.route(&path) {
                debug!(path = %path.display(), to = %to.display(), "matched");
                plan.add(&to, path);
            }
        }

        Ok(())
    }

    /// Record `path` and report whether its content was already examined.
    fn already_seen(&mut self, path: &Path, modified: SystemTime) -> Result<bool> {
        if let Some(record) = self.seen.get(path)
            && record.modified == modified
        {
            return Ok(true);
        }

        let digest = file_digest_hex(path)
            .with_context(|| format!("Failed to hash {}", path.display()))?;

        if let Some(record) = self.seen.get_mut(path)
            && record.digest == digest
        {
            record.modified = modified;
            return Ok(true);
        }

        self.seen
            .insert(path.to_path_buf(), SeenRecord { modified, digest });
        Ok(false)
    }

    /// Destination of the first rule matching the text of `path`.
    fn route(&self, path: &Path) -> Option<PathBuf> {
        let pages = match self.extractor.extract(path) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "text extraction failed");
                return None;
            }
        };
        let content = pages.join("\n");
        rules::first_match(&self.rules, &content).map(Path::to_path_buf)
    }
}
