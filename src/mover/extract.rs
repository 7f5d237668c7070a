//! Text extraction from routed documents.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Produces the text of a document, one string per page.
///
/// Extraction may be slow and may fail; the router treats a failure as
/// "no rule matches".
pub trait TextExtractor {
    /// Extract the pages of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or converted.
    fn extract(&self, path: &Path) -> Result<Vec<String>>;
}

impl<F> TextExtractor for F
where
    F: Fn(&Path) -> Result<Vec<String>>,
{
    fn extract(&self, path: &Path) -> Result<Vec<String>> {
        self(path)
    }
}

/// Runs poppler's `pdftotext` and splits its output on form feeds.
#[derive(Debug, Clone)]
pub struct PdfToText {
    /// Path to the `pdftotext` executable
    program: PathBuf,
}

impl PdfToText {
    /// Executable name looked up on `PATH`.
    pub const PROGRAM: &'static str = "pdftotext";

    /// Find `pdftotext` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable cannot be found.
    pub fn locate() -> Result<Self> {
        let program = which::which(Self::PROGRAM)
            .with_context(|| format!("{} not found in PATH", Self::PROGRAM))?;
        Ok(Self { program })
    }

    /// Use a specific executable.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl TextExtractor for PdfToText {
    fn extract(&self, path: &Path) -> Result<Vec<String>> {
        debug!(path = %path.display(), program = %self.program.display(), "extracting text");
        let output = Command::new(&self.program)
            .arg(path)
            .arg("-")
            .output()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} failed on {} ({}): {}",
                self.program.display(),
                path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// `pdftotext` terminates every page with a form feed.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\u{c}').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
