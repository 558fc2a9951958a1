//! gh-sync command - GitHub team and membership reconciliation
//!
//! Loads the org chart, then:
//! - removes managed GitHub teams the chart no longer has
//! - creates or reparents a team for every chart team, parents first
//! - converges every team's members and maintainers

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use gh_sync::config::{DEFAULT_API_URL, DEFAULT_TEAM_PREFIX};
use gh_sync::{GhSyncConfig, GhSyncService, SyncReport};
use tracing::info;

use crate::output;

#[derive(Args)]
pub struct GhSyncArgs {
    /// Chart location: CouchDB database URL, file:// URL or local path
    #[arg(long, env = "ORG_CHART_DATA_URL")]
    pub data_url: String,

    /// GitHub token with admin:org scope
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// GitHub organisation to sync
    #[arg(long)]
    pub github_org: String,

    /// Only teams whose name starts with this prefix are managed
    #[arg(long, default_value = DEFAULT_TEAM_PREFIX)]
    pub github_team_prefix: String,

    /// GitHub REST API root
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Log every decision without changing GitHub
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after teams are synced
    #[arg(long)]
    pub skip_members: bool
}

impl GhSyncArgs {
    fn config(&self) -> GhSyncConfig {
        GhSyncConfig {
            organization: self.github_org.clone(),
            token: self.github_token.clone(),
            team_prefix: self.github_team_prefix.clone(),
            api_url: self.github_api_url.clone(),
            dry_run: self.dry_run,
            skip_members: self.skip_members,
            ..GhSyncConfig::default()
        }
    }
}

pub async fn run(args: GhSyncArgs) -> Result<()> {
    let service =
        GhSyncService::from_config(args.config()).context("Invalid GitHub sync configuration")?;

    let mut chart = orgchart::load_chart(&args.data_url)
        .await
        .with_context(|| format!("Failed to load org chart from {}", args.data_url))?;
    chart
        .assign_remote_names(&service.config().team_prefix)
        .context("Org chart team ids cannot be mapped onto GitHub teams")?;
    info!(
        data_url = %args.data_url,
        teams = chart.teams().len(),
        employees = chart.employees().len(),
        "Loaded org chart"
    );

    match service.run(&chart).await {
        Ok(outcome) => {
            print_summary(&outcome.report);
            if outcome.report.dry_run {
                output::hint("Remove --dry-run to apply these changes");
            }
            Ok(())
        }
        Err(failure) => {
            print_summary(&failure.report);
            if let Some(seconds) = failure.source.retry_after() {
                output::hint(&format!("GitHub rate limit hit, retry in {}s", seconds));
            } else if failure.source.is_retryable() {
                output::hint("The failure looks transient; re-running the sync is safe");
            }
            Err(failure.into())
        }
    }
}

fn print_summary(report: &SyncReport) {
    if report.dry_run {
        output::header("GitHub sync (dry run)");
    } else {
        output::header("GitHub sync");
    }
    println!();

    print_teams("Created", &report.created_team_names());
    print_teams("Reparented", &report.reparented_team_names());
    print_teams("Removed", &report.removed_team_names());

    println!(
        "  {} {} added, {} removed",
        "Memberships:".dimmed(),
        report.memberships_added.to_string().green(),
        report.memberships_removed.to_string().yellow()
    );

    let missing = report.unable_to_create_membership.len() + report.unable_to_create_maintainer.len();
    if missing > 0 {
        output::warn(&format!("{} employees could not be synced, github handle not provided", missing));
    }
}

fn print_teams(label: &str, names: &[&str]) {
    let label = format!("{}:", label);
    if names.is_empty() {
        println!("  {} {}", label.dimmed(), "none".dimmed());
        return;
    }

    println!("  {} {}", label.dimmed(), names.len().to_string().cyan());
    for name in names {
        println!("    {}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_onto_config() {
        let args = GhSyncArgs {
            data_url: "chart.json".to_string(),
            github_token: "token".to_string(),
            github_org: "acme".to_string(),
            github_team_prefix: "eng-".to_string(),
            github_api_url: DEFAULT_API_URL.to_string(),
            dry_run: true,
            skip_members: false
        };

        let config = args.config();
        assert_eq!(config.organization, "acme");
        assert_eq!(config.team_prefix, "eng-");
        assert!(config.dry_run);
        assert_eq!(config.per_page, 100);
        assert!(config.check().is_ok());
    }
}
