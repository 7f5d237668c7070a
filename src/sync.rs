//! Periodic backup of monitored directories into a [`BlobStore`].
//!
//! One cycle walks every configured directory through the [`ChangeIndex`],
//! uploads each changed file under its remote name and, if anything changed,
//! publishes the dumped index so a later run on another machine can resume
//! from it.

use crate::config::SyncConfig;
use crate::manifest::ChangeIndex;
use crate::scanner::{DirectoryWalker, FsWalker};
use crate::storage::BlobStore;
use crate::utils::{format_size, remap_prefix};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of one [`Syncer::run_cycle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Paths the index reported as changed
    pub changed: usize,
    /// Changed paths stored remotely (or that would have been, in a dry run)
    pub uploaded: usize,
    /// Changed paths whose upload failed
    pub failed: usize,
}

/// Uploads changed files from the configured directories.
pub struct Syncer<S: BlobStore, W: DirectoryWalker = FsWalker> {
    config: SyncConfig,
    index: ChangeIndex<W>,
    store: S,
}

impl<S: BlobStore> Syncer<S, FsWalker> {
    /// Syncer with an empty index over the real filesystem.
    #[must_use]
    pub fn new(config: SyncConfig, store: S) -> Self {
        let index = ChangeIndex::new(config.include.clone(), config.exclude.clone());
        Self::with_index(config, index, store)
    }
}

impl<S: BlobStore, W: DirectoryWalker> Syncer<S, W> {
    /// Syncer around an existing index.
    #[must_use]
    pub const fn with_index(config: SyncConfig, index: ChangeIndex<W>, store: S) -> Self {
        Self {
            config,
            index,
            store,
        }
    }

    /// The index as of the last cycle.
    #[must_use]
    pub const fn index(&self) -> &ChangeIndex<W> {
        &self.index
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Resume from the index previously published to the store.
    ///
    /// A missing or unreachable remote index is not an error: the syncer
    /// starts from an empty index and the first cycle uploads everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote index was downloaded but cannot be
    /// loaded. The current index is left unchanged in that case.
    pub fn restore(&mut self) -> Result<()> {
        let name = &self.config.remote_manifest_file;
        match self.store.download(name) {
            Ok(data) => {
                self.index
                    .load(data.as_slice())
                    .with_context(|| format!("Could not load remote index {name:?}"))?;
                info!(name = %name, entries = self.index.len(), "restored index");
            }
            Err(e) => {
                warn!(name = %name, error = %e, "could not restore index, starting empty");
            }
        }
        Ok(())
    }

    /// Run one synchronization cycle.
    ///
    /// Directories are visited in sorted order. If one cannot be scanned the
    /// cycle stops there, keeping what earlier directories uploaded. A dry
    /// run logs uploads and leaves both the store and `manifest_file` alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be dumped, saved or published.
    pub fn run_cycle(&mut self, dry_run: bool) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        for (local, remote) in &self.config.dirs {
            let changed = match self.index.update(local) {
                Ok(changed) => changed,
                Err(e) => {
                    warn!(dir = %local.display(), error = %e, "stopping cycle");
                    break;
                }
            };

            for path in changed {
                report.changed += 1;
                let name = remap_prefix(&path, local, remote);
                match upload_file(&self.store, &path, &name, dry_run) {
                    Ok(()) => report.uploaded += 1,
                    Err(e) => {
                        warn!(from = %path.display(), to = %name, error = %e, "upload failed");
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            changed = report.changed,
            uploaded = report.uploaded,
            failed = report.failed,
            "cycle finished"
        );

        if report.changed > 0 {
            self.publish_index(dry_run)?;
        }
        Ok(report)
    }

    /// Save the index locally and upload it under `remote_manifest_file`.
    fn publish_index(&self, dry_run: bool) -> Result<()> {
        let mut data = Vec::new();
        self.index.dump(&mut data)?;
        let name = &self.config.remote_manifest_file;

        if dry_run {
            info!(name = %name, size = %format_size(data.len() as u64), "dry run: uploading index");
            return Ok(());
        }

        self.index.save(&self.config.manifest_file)?;
        self.store
            .upload(name, &data)
            .with_context(|| format!("Could not upload index to {name:?}"))?;
        debug!(name = %name, entries = self.index.len(), "published index");
        Ok(())
    }
}

fn upload_file<S: BlobStore>(store: &S, path: &Path, name: &str, dry_run: bool) -> Result<()> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if dry_run {
        info!(to = %name, size = %format_size(data.len() as u64), "dry run: uploading");
        return Ok(());
    }
    store.upload(name, &data)
}
