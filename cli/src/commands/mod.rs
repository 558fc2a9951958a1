pub mod export;
pub mod gh_sync;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "org-chart",
    author,
    version,
    about = "Org chart tooling - GitHub team sync and flattened exports",
    long_about = "Reads the org chart from a CouchDB database or a local JSON file.\n\nKeeps GitHub \
                  teams and memberships in line with it, or exports employees, teams and \
                  vacancies as JSON lines or CSV."
)]
pub struct Cli {
    /// Log at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sync GitHub teams and memberships with the org chart")]
    GhSync(gh_sync::GhSyncArgs),

    #[command(about = "Export employees with their team and reporting line")]
    ExportEmployees(export::ExportArgs),

    #[command(about = "Export teams with their ancestry and leads")]
    ExportTeams(export::ExportArgs),

    #[command(about = "Export open vacancies and backfills per team and stream")]
    ExportVacancies(export::ExportArgs)
}
