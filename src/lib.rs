#![warn(missing_docs)]
#![allow(clippy::arithmetic_side_effects)] // Counters and size calculations cannot overflow
#![allow(clippy::float_arithmetic)] // Required for file size formatting

//! # Docsync - Document Backup and Routing
//!
//! Docsync keeps document folders backed up and tidy. It has two engines
//! sharing a small set of filesystem primitives:
//!
//! - **Change index** ([`manifest`]): remembers the modification time and
//!   xxHash3 digest of every tracked file and reports what changed since the
//!   last scan. The index is persisted with bincode so a later run, possibly
//!   on another machine, resumes where the previous one stopped.
//! - **Content router** ([`mover`]): extracts the text of new documents and
//!   moves each one into the destination of the first rule whose patterns
//!   all match, refusing to overwrite anything.
//!
//! ## Architecture
//!
//! - [`scanner`]: one-level directory listing behind the [`DirectoryWalker`](scanner::DirectoryWalker) trait
//! - [`manifest`]: the change index and its include/exclude filter
//! - [`mover`]: routing rules, text extraction and move plans
//! - [`sync`]: the backup cycle tying the index to a [`storage`] backend
//! - [`config`]: TOML configuration parsing and validation
//! - [`commands`]: the polling loops behind each subcommand
//! - [`utils`]: hashing, the index file format and path helpers
//!
//! ## Example Usage
//!
//! ```no_run
//! use docsync::manifest::ChangeIndex;
//! use docsync::pattern::PatternSet;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let include = PatternSet::new([r"\.pdf$"])?;
//! let mut index = ChangeIndex::new(include, PatternSet::default());
//!
//! for path in index.update(Path::new("/home/me/Documents"))? {
//!     println!("changed: {}", path.display());
//! }
//! index.save(Path::new("/home/me/.cache/docsync/manifest.bin"))?;
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing the CLI command implementations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Incremental change detection over directory trees.
pub mod manifest;

/// Content-based document routing.
pub mod mover;

/// Compiled regular expression lists.
pub mod pattern;

/// Filesystem listing primitives.
pub mod scanner;

/// Remote blob storage backends.
pub mod storage;

/// Backup cycle over the configured directories.
pub mod sync;

/// Logging setup.
pub mod telemetry;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Current version of the docsync binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/docsync/config.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "DOCSYNC_CONFIG_PATH";

/// Loaded configuration plus where it came from.
///
/// ```no_run
/// use docsync::DocsyncContext;
///
/// # fn main() -> anyhow::Result<()> {
/// let ctx = DocsyncContext::new(None)?;
/// let mover = ctx.config.mover()?;
/// println!("{} rules", mover.rules.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DocsyncContext {
    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Parsed configuration. Sections are validated on access.
    pub config: config::Config,
}

impl DocsyncContext {
    /// Load the configuration from `config_path`, or from the default
    /// location when `None`.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or the
    /// configuration file cannot be read or parsed.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => config::Config::default_path()?,
        };
        let config = config::Config::load(&config_path).with_context(|| {
            format!("Could not load config from {}", config_path.display())
        })?;
        tracing::debug!(path = %config_path.display(), "loaded config");

        Ok(Self {
            config_path,
            config,
        })
    }
}
