use crate::config::GhSyncConfig;
use crate::context::SyncContext;
use crate::diff::{Drift, diff};
use crate::error::{GhSyncError, GhSyncResult};
use crate::github::{GithubClient, create_github_client};
use crate::materialize::TeamMaterializer;
use crate::membership::{MembershipReconciler, desired_memberships};
use crate::mutator::{RemoteMutator, mutator_for};
use crate::report::SyncReport;
use crate::snapshot::RemoteSnapshot;
use orgchart::OrgChart;
use std::sync::Arc;
use strum::Display;
use thiserror::Error;
use tracing::{error, info};

/// Where a sync run is. Runs move strictly forward through these; any error
/// ends the run in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SyncPhase {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "collecting remote state")]
    Collecting,
    #[strum(serialize = "removing teams")]
    RemovingTeams,
    #[strum(serialize = "materializing teams")]
    MaterializingTeams,
    #[strum(serialize = "reconciling members")]
    ReconcilingMembers,
    #[strum(serialize = "done")]
    Done,
    #[strum(serialize = "failed")]
    Failed
}

/// A run that stopped early. `report` holds whatever was done before the
/// failing phase gave up.
#[derive(Debug, Error)]
#[error("GitHub sync failed while {phase}: {source}")]
pub struct SyncFailure {
    pub phase: SyncPhase,
    pub report: Box<SyncReport>,
    pub source: GhSyncError
}

impl SyncFailure {
    fn new(phase: SyncPhase, mut report: SyncReport, source: GhSyncError) -> Self {
        report.complete();
        Self {
            phase,
            report: Box::new(report),
            source
        }
    }
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub report: SyncReport,
    /// Drift detected before any mutation.
    pub drift: Drift,
    /// Remote state as the run left it.
    pub snapshot: RemoteSnapshot
}

pub struct GhSyncService {
    config: GhSyncConfig,
    client: Arc<dyn GithubClient>,
    mutator: Arc<dyn RemoteMutator>
}

impl GhSyncService {
    pub fn new(config: GhSyncConfig, client: Arc<dyn GithubClient>) -> Self {
        let mutator = mutator_for(client.clone(), config.dry_run);
        Self {
            config,
            client,
            mutator
        }
    }

    /// Validates `config` and talks to the GitHub REST API it points at.
    pub fn from_config(config: GhSyncConfig) -> GhSyncResult<Self> {
        config.check()?;
        let client = create_github_client(config.clone())?;
        Ok(Self::new(config, client))
    }

    pub fn with_mutator(mut self, mutator: Arc<dyn RemoteMutator>) -> Self {
        self.mutator = mutator;
        self
    }

    pub fn config(&self) -> &GhSyncConfig {
        &self.config
    }

    pub async fn collect(&self) -> GhSyncResult<RemoteSnapshot> {
        RemoteSnapshot::collect(self.client.as_ref(), &self.config.team_prefix).await
    }

    /// Collects remote state, then syncs `chart` against it.
    pub async fn run(&self, chart: &OrgChart) -> Result<SyncOutcome, SyncFailure> {
        info!(
            organization = %self.config.organization,
            prefix = %self.config.team_prefix,
            "Starting GitHub sync"
        );

        self.check_chart(chart)
            .map_err(|e| self.fail(SyncPhase::Idle, SyncReport::new(self.config.dry_run), e))?;

        let snapshot = self.collect().await.map_err(|e| {
            self.fail(SyncPhase::Collecting, SyncReport::new(self.config.dry_run), e)
        })?;

        self.sync_checked(chart, snapshot).await
    }

    /// Converges the remote state in `snapshot` to `chart`: drift is logged,
    /// stale teams removed, every chart team materialized and, unless
    /// skipped, every roster reconciled.
    pub async fn sync(&self, chart: &OrgChart, snapshot: RemoteSnapshot) -> Result<SyncOutcome, SyncFailure> {
        self.check_chart(chart)
            .map_err(|e| self.fail(SyncPhase::Idle, SyncReport::new(self.config.dry_run), e))?;

        self.sync_checked(chart, snapshot).await
    }

    async fn sync_checked(&self, chart: &OrgChart, snapshot: RemoteSnapshot) -> Result<SyncOutcome, SyncFailure> {
        let mut ctx = SyncContext::new(snapshot, self.config.dry_run);

        if self.config.dry_run {
            info!("running in DRY mode");
        }

        let drift = diff(chart, &ctx.snapshot);
        drift.log();

        let mut phase = SyncPhase::Idle;
        match self.run_phases(chart, &drift, &mut ctx, &mut phase).await {
            Ok(()) => {
                ctx.report.complete();
                ctx.report.log();
                Ok(SyncOutcome {
                    report: ctx.report,
                    drift,
                    snapshot: ctx.snapshot
                })
            }
            Err(e) => Err(self.fail(phase, ctx.report, e))
        }
    }

    async fn run_phases(
        &self,
        chart: &OrgChart,
        drift: &Drift,
        ctx: &mut SyncContext,
        phase: &mut SyncPhase
    ) -> GhSyncResult<()> {
        let mut materializer = TeamMaterializer::new(chart, self.mutator.as_ref());

        enter(phase, SyncPhase::RemovingTeams);
        materializer
            .remove_teams(&drift.teams_only_in_remote, ctx)
            .await?;

        enter(phase, SyncPhase::MaterializingTeams);
        materializer.ensure_all(ctx).await?;

        if self.config.skip_members {
            info!("skipping members sync");
        } else {
            enter(phase, SyncPhase::ReconcilingMembers);
            let memberships = desired_memberships(chart, &ctx.snapshot, &mut ctx.report)?;
            MembershipReconciler::new(self.client.as_ref(), self.mutator.as_ref())
                .reconcile_all(&memberships, &mut ctx.report)
                .await?;
        }

        enter(phase, SyncPhase::Done);
        Ok(())
    }

    fn check_chart(&self, chart: &OrgChart) -> GhSyncResult<()> {
        match chart.remote_prefix() {
            Some(prefix) if prefix == self.config.team_prefix => Ok(()),
            Some(prefix) => Err(GhSyncError::ConfigError(format!(
                "chart remote names use prefix {:?}, sync is configured for {:?}",
                prefix, self.config.team_prefix
            ))),
            None => Err(GhSyncError::ConfigError(
                "chart has no remote team names assigned".to_string()
            ))
        }
    }

    fn fail(&self, phase: SyncPhase, report: SyncReport, source: GhSyncError) -> SyncFailure {
        error!(
            phase = %phase,
            error = %source,
            retryable = source.is_retryable(),
            "GitHub sync failed"
        );
        info!(phase = %SyncPhase::Failed, "Sync phase changed");
        SyncFailure::new(phase, report, source)
    }
}

fn enter(phase: &mut SyncPhase, next: SyncPhase) {
    info!(from = %phase, to = %next, "Sync phase changed");
    *phase = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(SyncPhase::MaterializingTeams.to_string(), "materializing teams");
        assert_eq!(SyncPhase::Collecting.to_string(), "collecting remote state");
    }

    #[test]
    fn test_failure_message_names_phase() {
        let failure = SyncFailure::new(
            SyncPhase::ReconcilingMembers,
            SyncReport::new(false),
            GhSyncError::TeamNotSynced {
                team: "org-data".to_string()
            }
        );

        assert_eq!(
            failure.to_string(),
            "GitHub sync failed while reconciling members: Team org-data not found in github"
        );
        assert!(failure.report.completed_at.is_some());
    }
}
