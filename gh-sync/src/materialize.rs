//! Brings remote teams in line with the chart's team forest.

use crate::context::SyncContext;
use crate::error::{GhSyncError, GhSyncResult};
use crate::github::{RemoteTeam, TeamPrivacy, TeamSpec};
use crate::mutator::RemoteMutator;
use crate::report::TeamChange;
use orgchart::{OrgChart, Team};
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub struct TeamMaterializer<'a> {
    chart: &'a OrgChart,
    mutator: &'a dyn RemoteMutator,
    /// Chart team ids already materialized in this run.
    ensured: HashSet<String>
}

impl<'a> TeamMaterializer<'a> {
    pub fn new(chart: &'a OrgChart, mutator: &'a dyn RemoteMutator) -> Self {
        Self {
            chart,
            mutator,
            ensured: HashSet::new()
        }
    }

    /// Deletes `teams` remotely and drops them from the snapshot. Teams that
    /// already went with a removed parent get no delete call of their own but
    /// are still reported as removed.
    pub async fn remove_teams(&self, teams: &[RemoteTeam], ctx: &mut SyncContext) -> GhSyncResult<()> {
        for team in teams {
            if ctx.snapshot.team(&team.name).is_none() {
                debug!(team = %team.name, "Team already removed with its parent");
                ctx.report.removed_teams.push(TeamChange::from(team));
                continue;
            }

            self.mutator
                .delete_team(team)
                .await
                .map_err(|e| GhSyncError::mutation("delete team", &team.name, e))?;

            ctx.report.removed_teams.push(TeamChange::from(team));

            for child in ctx.snapshot.remove_team(&team.name) {
                warn!(
                    team = %child.name,
                    parent = %team.name,
                    "github team removed together with its parent"
                );
            }
        }

        Ok(())
    }

    /// Materializes every chart team, in chart order.
    pub async fn ensure_all(&mut self, ctx: &mut SyncContext) -> GhSyncResult<()> {
        let chart = self.chart;
        for team in chart.teams() {
            self.ensure_team(&team.id, ctx).await?;
        }
        Ok(())
    }

    /// Guarantees a remote team exists for chart team `team_id` with the
    /// chart's parent linkage, materializing its ancestors first.
    pub async fn ensure_team(&mut self, team_id: &str, ctx: &mut SyncContext) -> GhSyncResult<RemoteTeam> {
        let chain = self.ancestor_chain(team_id)?;

        for team in chain {
            self.materialize(team, ctx).await?;
            self.ensured.insert(team.id.clone());
        }

        let team = self
            .chart
            .team(team_id)
            .ok_or_else(|| GhSyncError::UnknownTeam(team_id.to_string()))?;

        ctx.snapshot
            .team(&team.remote_name)
            .cloned()
            .ok_or_else(|| GhSyncError::TeamNotSynced {
                team: team.remote_name.clone()
            })
    }

    /// `team_id` and its not yet materialized ancestors, root-most first.
    fn ancestor_chain(&self, team_id: &str) -> GhSyncResult<Vec<&'a Team>> {
        let mut chain: Vec<&'a Team> = Vec::new();
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut current = Some(team_id.to_string());

        while let Some(id) = current {
            if self.ensured.contains(&id) {
                break;
            }

            let team = self
                .chart
                .team(&id)
                .ok_or_else(|| GhSyncError::UnknownTeam(id.clone()))?;

            if !visited.insert(team.id.as_str()) {
                let mut ids: Vec<&str> = chain.iter().map(|t| t.id.as_str()).collect();
                ids.push(&team.id);
                return Err(GhSyncError::CyclicHierarchy {
                    chain: ids.join(" -> ")
                });
            }

            chain.push(team);
            current = team.parent_id.clone();
        }

        chain.reverse();
        Ok(chain)
    }

    async fn materialize(&self, team: &Team, ctx: &mut SyncContext) -> GhSyncResult<RemoteTeam> {
        let parent = match team.remote_parent_name.as_deref() {
            Some(parent_name) => Some(ctx.snapshot.team(parent_name).cloned().ok_or_else(|| {
                GhSyncError::TeamNotSynced {
                    team: parent_name.to_string()
                }
            })?),
            None => None
        };

        let spec = TeamSpec {
            name: team.remote_name.clone(),
            description: team.description.clone(),
            privacy: TeamPrivacy::Closed,
            parent_team_id: parent.as_ref().map(|p| p.id)
        };

        let change = |remote: &RemoteTeam| TeamChange {
            id: remote.id,
            name: remote.name.clone(),
            parent: team.remote_parent_name.clone()
        };

        if let Some(existing) = ctx.snapshot.team(&team.remote_name).cloned() {
            if existing.parent_name() == team.remote_parent_name.as_deref() {
                return Ok(existing);
            }

            info!(
                team = %existing.name,
                from = ?existing.parent_name(),
                to = ?team.remote_parent_name,
                "Reparenting github team"
            );

            let edited = self
                .mutator
                .edit_team(&existing, &spec, parent.as_ref())
                .await
                .map_err(|e| GhSyncError::mutation("edit team", &existing.name, e))?;

            ctx.report.reparented_teams.push(change(&edited));
            ctx.snapshot.upsert_team(edited.clone());
            return Ok(edited);
        }

        info!(team = %spec.name, parent = ?team.remote_parent_name, "Creating github team");

        let created = self
            .mutator
            .create_team(&spec, parent.as_ref())
            .await
            .map_err(|e| GhSyncError::mutation("create team", &spec.name, e))?;

        ctx.report.created_teams.push(change(&created));
        ctx.snapshot.upsert_team(created.clone());
        Ok(created)
    }
}
