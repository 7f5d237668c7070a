use super::{effective_interval, poll, print_info, print_success, print_warning};
use crate::DocsyncContext;
use crate::storage::LocalStore;
use crate::sync::Syncer;
use anyhow::Result;
use tracing::error;

/// Back up the configured directories, once or every interval.
///
/// # Errors
///
/// Returns an error if:
/// - The `[sync]` section is missing or invalid
/// - The remote index exists but cannot be loaded
/// - With `once`, the cycle fails to publish the index
pub fn execute(
    ctx: &DocsyncContext,
    dry_run: bool,
    once: bool,
    interval: Option<&str>,
) -> Result<()> {
    let config = ctx.config.sync()?;
    let interval = effective_interval(config.interval()?, interval)?;

    let mut syncer = Syncer::new(config.clone(), LocalStore::new(&config.store));
    syncer.restore()?;
    if dry_run {
        print_info("Dry run: nothing will be uploaded");
    }

    poll(
        once,
        interval,
        || {
            let report = syncer.run_cycle(dry_run)?;
            if report.failed > 0 {
                print_warning(&format!(
                    "{} of {} changed files failed to upload",
                    report.failed, report.changed
                ));
            } else if report.changed > 0 {
                print_success(&format!("Uploaded {} changed files", report.uploaded));
            }
            Ok(())
        },
        |e| {
            error!(error = %e, "sync cycle failed");
            Ok(())
        },
    )
}
