//! Utility functions and helpers.
//!
//! - Path manipulation (tilde expansion, prefix remapping)
//! - File size formatting
//!
//! # Submodules
//!
//! - [`hash`]: Content digests for the index and the router
//! - [`serialization`]: Versioned binary serialization
//!
//! # Examples
//!
//! ```
//! use docsync::utils::{expand_tilde, format_size};
//!
//! # fn main() -> anyhow::Result<()> {
//! // Expand tilde in paths
//! let path = expand_tilde("~/Documents")?;
//!
//! // Format file sizes
//! let size_str = format_size(1024 * 1024); // "1.00 MB"
//! # Ok(())
//! # }
//! ```

/// Content digests
pub mod hash;
/// Binary serialization utilities
pub mod serialization;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Expands a path starting with `~` to the user's home directory.
///
/// # Errors
///
/// Returns an error if the path is empty.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        anyhow::bail!("Path cannot be empty");
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Ok(home);
    }
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Ok(home.join(&path[2..]));
    }
    Ok(PathBuf::from(path))
}

/// Expands `~` in an already-parsed path, leaving other paths untouched.
///
/// # Errors
///
/// Returns an error if the path is empty.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    expand_tilde(&path.to_string_lossy())
}

/// Rewrite the first occurrence of the `from` prefix in `path` to `to`.
///
/// Used to derive a remote blob name from a local file path. Paths that do
/// not start with `from` are returned with `to` prepended to their full form.
#[must_use]
pub fn remap_prefix(path: &Path, from: &Path, to: &str) -> String {
    let rest = path.strip_prefix(from).unwrap_or(path);
    let rest = rest.to_string_lossy();
    let rest = rest.trim_start_matches('/');
    let to = to.trim_end_matches('/');
    match (to.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => to.to_string(),
        (false, false) => format!("{to}/{rest}"),
    }
}

/// Formats a file size in bytes into a human-readable string with appropriate units.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size.round() as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
