//! Configuration loading.
//!
//! The file is TOML with an optional `[sync]` and an optional `[mover]`
//! section. Patterns are compiled while parsing, so an invalid regex is a
//! parse error; everything else is checked by [`validator`] when a section is
//! requested.

/// Semantic checks on parsed sections
pub mod validator;

use crate::mover::Rule;
use crate::pattern::PatternSet;
use crate::utils::expand_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration file. Either section may be absent when only
/// one of the commands is used.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backup of monitored directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncConfig>,

    /// Content-based routing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mover: Option<MoverConfig>,
}

/// Which directories to back up, and where the index lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Time between cycles, e.g. "10m"
    #[serde(default = "default_sync_interval")]
    pub interval: String,
    /// Local copy of the dumped index
    pub manifest_file: PathBuf,
    /// Blob name the dumped index is uploaded under
    pub remote_manifest_file: String,
    /// Root directory of the [`LocalStore`](crate::storage::LocalStore)
    pub store: PathBuf,
    /// Base-name patterns a file must match to be tracked (any)
    #[serde(default)]
    pub include: PatternSet,
    /// Base-name patterns that exclude a file (any)
    #[serde(default)]
    pub exclude: PatternSet,
    /// Local directory -> remote name prefix
    pub dirs: BTreeMap<PathBuf, String>,
}

/// Which directories to route documents out of, and by which rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoverConfig {
    /// Source roots, scanned in order
    pub from: Vec<PathBuf>,
    /// Time between scans, e.g. "1m"
    #[serde(default = "default_mover_interval")]
    pub interval: String,
    /// Evaluated in order; the first matching rule decides the destination
    pub rules: Vec<Rule>,
}

fn default_sync_interval() -> String {
    "10m".to_string()
}

fn default_mover_interval() -> String {
    "1m".to_string()
}

impl SyncConfig {
    /// Parsed cycle interval.
    ///
    /// # Errors
    ///
    /// Returns an error if `interval` is not a humantime duration.
    pub fn interval(&self) -> Result<Duration> {
        parse_interval(&self.interval)
    }
}

impl MoverConfig {
    /// Parsed scan interval.
    ///
    /// # Errors
    ///
    /// Returns an error if `interval` is not a humantime duration.
    pub fn interval(&self) -> Result<Duration> {
        parse_interval(&self.interval)
    }
}

/// Parse a duration such as `"90s"` or `"1h 30m"`.
///
/// # Errors
///
/// Returns an error if the string is not a valid duration.
pub fn parse_interval(value: &str) -> Result<Duration> {
    humantime::parse_duration(value).with_context(|| format!("Invalid interval: {value:?}"))
}

impl Config {
    /// Default configuration file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(crate::DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from a file, expanding `~` in every path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot read the configuration file
    /// - Configuration file contains invalid TOML or an invalid pattern
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from TOML text, expanding `~` in every path.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).context("Failed to parse TOML config")?;
        config.expand_paths()?;
        Ok(config)
    }

    /// The `[sync]` section, validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is missing or invalid.
    pub fn sync(&self) -> Result<&SyncConfig> {
        let sync = self
            .sync
            .as_ref()
            .context("No [sync] section in configuration")?;
        validator::validate_sync(sync)?;
        Ok(sync)
    }

    /// The `[mover]` section, validated. Missing rule destinations are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is missing or invalid.
    pub fn mover(&self) -> Result<&MoverConfig> {
        let mover = self
            .mover
            .as_ref()
            .context("No [mover] section in configuration")?;
        validator::validate_mover(mover)?;
        Ok(mover)
    }

    fn expand_paths(&mut self) -> Result<()> {
        if let Some(sync) = &mut self.sync {
            let dirs = std::mem::take(&mut sync.dirs);
            for (local, remote) in dirs {
                sync.dirs.insert(expand_path(&local)?, remote);
            }
            if !sync.manifest_file.as_os_str().is_empty() {
                sync.manifest_file = expand_path(&sync.manifest_file)?;
            }
            sync.store = expand_path(&sync.store)?;
        }
        if let Some(mover) = &mut self.mover {
            for dir in &mut mover.from {
                *dir = expand_path(dir)?;
            }
            for rule in &mut mover.rules {
                if !rule.to.as_os_str().is_empty() {
                    rule.to = expand_path(&rule.to)?;
                }
            }
        }
        Ok(())
    }
}
