use super::{effective_interval, poll, print_error, print_info, print_success, print_warning};
use crate::DocsyncContext;
use crate::mover::{ContentRouter, PdfToText};
use anyhow::Result;

/// Route new documents out of the configured source directories.
///
/// In dry-run mode, planned moves are logged and nothing is touched.
///
/// # Errors
///
/// Returns an error if:
/// - The `[mover]` section is missing or invalid
/// - `pdftotext` cannot be found
/// - A scan fails
pub fn execute(
    ctx: &DocsyncContext,
    dry_run: bool,
    once: bool,
    interval: Option<&str>,
) -> Result<()> {
    let config = ctx.config.mover()?;
    let interval = effective_interval(config.interval()?, interval)?;

    let extractor = PdfToText::locate()?;
    let mut router = ContentRouter::new(config.from.clone(), config.rules.clone(), extractor);
    if dry_run {
        print_info("Dry run: planned moves are only logged");
    }

    poll(
        once,
        interval,
        || {
            let outcome = router.scan(dry_run)?;
            let planned = outcome.plan.file_count();
            for failure in &outcome.failures {
                print_error(&failure.to_string());
            }
            if !outcome.failures.is_empty() {
                print_warning(&format!(
                    "{} of {} moves were declined or failed",
                    outcome.failures.len(),
                    planned
                ));
            } else if planned > 0 && !dry_run {
                print_success(&format!("Moved {planned} documents"));
            }
            Ok(())
        },
        Err,
    )
}
