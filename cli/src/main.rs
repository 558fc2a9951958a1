use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout carries exports, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::GhSync(args) => commands::gh_sync::run(args).await,
        Commands::ExportEmployees(args) => commands::export::employees(args).await,
        Commands::ExportTeams(args) => commands::export::teams(args).await,
        Commands::ExportVacancies(args) => commands::export::vacancies(args).await
    }
}
