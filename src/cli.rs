//! Command-line interface definitions for docsync.
//!
//! The definitions are shared between the main binary and xtask, which
//! renders the man page from them.

#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for docsync.
#[derive(Parser)]
#[command(
    name = "docsync",
    version = crate::VERSION,
    about = "Back up document folders and route new documents by content",
    long_about = "Keeps an incremental index of monitored directories for backup, \
                  and moves new PDFs into folders chosen by the text they contain"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ~/.config/docsync/config.toml)
    #[arg(short, long, global = true, env = crate::CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Upload changed files from the monitored directories
    Sync {
        /// Log uploads instead of performing them
        #[arg(long)]
        dry_run: bool,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Override the configured interval between cycles
        #[arg(long)]
        interval: Option<String>,
    },

    /// Move new documents into folders chosen by their text
    Move {
        /// Only log planned moves (default: true, pass `--dry-run false` to move)
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        dry_run: bool,

        /// Run a single scan and exit
        #[arg(long)]
        once: bool,

        /// Override the configured interval between scans
        #[arg(long)]
        interval: Option<String>,
    },

    /// Fetch one stored file back from the backup store
    Download {
        /// Blob name in the store, e.g. "docs/report.pdf"
        name: String,

        /// Where to write the file locally
        destination: PathBuf,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
