//! sitemap2posts CLI - blog post discovery from sitemaps
//!
//! This is the main entry point for the sitemap2posts command-line
//! interface. Command implementations live in [`commands`].

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;
mod commands;
mod obstracts;
mod progress;
mod summary;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    execute_command(cli).await
}

fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn execute_command(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Crawl(args) => {
            commands::crawl(args, cli.quiet).await?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Sync(args) => commands::sync(args).await,
    }
}
