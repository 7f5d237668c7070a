use super::{MoverConfig, SyncConfig};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Shortest allowed time between sync cycles.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(10);

/// Check a `[sync]` section.
///
/// # Errors
///
/// Returns an error naming the first problem found:
/// - `dirs` is empty or names something that is not a directory
/// - `interval` is unparseable or shorter than [`MIN_SYNC_INTERVAL`]
/// - `manifest_file` or `remote_manifest_file` is empty
pub fn validate_sync(config: &SyncConfig) -> Result<()> {
    if config.dirs.is_empty() {
        anyhow::bail!("dirs empty: at least one dir needs to be provided");
    }
    for dir in config.dirs.keys() {
        require_dir(dir).with_context(|| format!("dirs entry {} invalid", dir.display()))?;
    }

    let interval = config.interval()?;
    if interval < MIN_SYNC_INTERVAL {
        anyhow::bail!(
            "interval too small: at least {}",
            humantime::format_duration(MIN_SYNC_INTERVAL)
        );
    }

    if config.manifest_file.as_os_str().is_empty() {
        anyhow::bail!("manifest_file empty");
    }
    if config.remote_manifest_file.trim().is_empty() {
        anyhow::bail!("remote_manifest_file empty");
    }
    Ok(())
}

/// Check a `[mover]` section, creating rule destinations that do not exist yet.
///
/// # Errors
///
/// Returns an error naming the first problem found:
/// - `from` is empty or names something that is not a directory
/// - `rules` is empty, or a rule has no patterns or no destination
/// - a destination cannot be created or is not a directory
/// - `interval` is unparseable or zero
pub fn validate_mover(config: &MoverConfig) -> Result<()> {
    if config.from.is_empty() {
        anyhow::bail!("nothing specified in from field");
    }
    for dir in &config.from {
        require_dir(dir).with_context(|| format!("{} in mover", dir.display()))?;
    }

    if config.rules.is_empty() {
        anyhow::bail!("nothing specified in rules field");
    }
    for rule in &config.rules {
        if rule.patterns.is_empty() {
            anyhow::bail!(
                "rule for {}: at least one pattern is required",
                rule.to.display()
            );
        }
        if rule.to.as_os_str().is_empty() {
            anyhow::bail!(
                "rule {:?}: to is required",
                rule.patterns.as_strings()
            );
        }
        if !rule.to.exists() {
            std::fs::create_dir_all(&rule.to).with_context(|| {
                format!("{} in mover: tried to create", rule.to.display())
            })?;
        }
        require_dir(&rule.to).with_context(|| format!("{} in mover", rule.to.display()))?;
    }

    if config.interval()?.is_zero() {
        anyhow::bail!("interval must be positive");
    }
    Ok(())
}

fn require_dir(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_dir() {
        anyhow::bail!("not a directory");
    }
    Ok(())
}
