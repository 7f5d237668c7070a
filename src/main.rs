use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use docsync::cli::{Cli, Commands};
use docsync::{DocsyncContext, commands, telemetry};
use std::io;
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    match cli.command {
        Commands::Sync {
            dry_run,
            once,
            interval,
        } => {
            let ctx = DocsyncContext::new(cli.config)?;
            commands::sync::execute(&ctx, dry_run, once, interval.as_deref())?;
        }
        Commands::Move {
            dry_run,
            once,
            interval,
        } => {
            let ctx = DocsyncContext::new(cli.config)?;
            commands::mover::execute(&ctx, dry_run, once, interval.as_deref())?;
        }
        Commands::Download { name, destination } => {
            let ctx = DocsyncContext::new(cli.config)?;
            commands::download::execute(&ctx, &name, &destination)?;
        }
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
        }
    }

    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
