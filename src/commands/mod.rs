//! Subcommand implementations.
//!
//! Each command loads its configuration section from the context, then runs
//! its engine either once or in a fixed-interval polling loop.

/// The `download` command
pub mod download;
/// The `move` command
pub mod mover;
/// The `sync` command
pub mod sync;

use anyhow::Result;
use colored::Colorize;
use std::time::Duration;

/// Print a success line to stdout.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error line to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an informational line to stdout.
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning line to stdout.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Resolve the effective interval: the command-line override if given,
/// otherwise the configured one.
///
/// # Errors
///
/// Returns an error if the override is not a valid duration or is zero.
pub fn effective_interval(configured: Duration, overridden: Option<&str>) -> Result<Duration> {
    let Some(value) = overridden else {
        return Ok(configured);
    };
    let interval = crate::config::parse_interval(value)?;
    if interval.is_zero() {
        anyhow::bail!("interval must be positive");
    }
    Ok(interval)
}

/// Call `cycle` once, or forever with `interval` sleeps in between.
///
/// With `once` an error from `cycle` is returned. In the loop, errors are
/// handed to `on_error`, which decides whether to keep going.
///
/// # Errors
///
/// Returns the first error `on_error` declines to absorb.
pub fn poll<F, H>(once: bool, interval: Duration, mut cycle: F, mut on_error: H) -> Result<()>
where
    F: FnMut() -> Result<()>,
    H: FnMut(anyhow::Error) -> Result<()>,
{
    if once {
        return cycle();
    }
    loop {
        if let Err(e) = cycle() {
            on_error(e)?;
        }
        tracing::debug!(interval = %humantime::format_duration(interval), "sleeping");
        std::thread::sleep(interval);
    }
}
