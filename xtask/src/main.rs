//! xtask for docsync - build automation and tooling

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for docsync")]
enum Task {
    /// Generate man pages from clap definitions
    GenerateManPages {
        /// Output directory for man pages (default: ./man)
        #[arg(short, long, default_value = "man")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    match Task::parse() {
        Task::GenerateManPages { output } => generate_man_pages(&output)?,
    }
    Ok(())
}

fn render(cmd: clap::Command, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create man page: {}", path.display()))?;
    clap_mangen::Man::new(cmd).render(&mut std::io::BufWriter::new(file))?;
    println!("✓ Generated: {}", path.display());
    Ok(())
}

fn generate_man_pages(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let cmd = docsync::cli::Cli::command();
    render(cmd.clone(), &output_dir.join("docsync.1"))?;

    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "completion") {
        let path = output_dir.join(format!("docsync-{}.1", sub.get_name()));
        render(sub.clone(), &path)?;
    }

    println!(
        "\nInstall with: sudo cp {}/*.1 /usr/share/man/man1/",
        output_dir.display()
    );
    Ok(())
}
