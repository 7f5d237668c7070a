use super::print_success;
use crate::DocsyncContext;
use crate::storage::{BlobStore, LocalStore};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Fetch one blob from the store and write it to `destination`.
///
/// The file is created owner-readable only (mode 0600 on unix) and replaces
/// whatever was there. Only the `store` of the `[sync]` section is consulted,
/// so the monitored directories need not exist on the machine restoring.
///
/// # Errors
///
/// Returns an error if:
/// - The `[sync]` section is missing
/// - The blob does not exist or cannot be read
/// - The destination cannot be written
pub fn execute(ctx: &DocsyncContext, name: &str, destination: &Path) -> Result<()> {
    let sync = ctx
        .config
        .sync
        .as_ref()
        .context("No [sync] section in configuration")?;
    let store = LocalStore::new(&sync.store);

    info!("Downloading {name:?} to {}", destination.display());
    let contents = store
        .download(name)
        .with_context(|| format!("Could not download {name:?}"))?;

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(destination)
        .with_context(|| format!("Could not open {} for writing", destination.display()))?;
    file.write_all(&contents)
        .with_context(|| format!("Could not write bytes to {}", destination.display()))?;

    print_success(&format!(
        "Downloaded {name} ({})",
        crate::utils::format_size(contents.len() as u64)
    ));
    Ok(())
}
