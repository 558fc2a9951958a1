//! Converges each remote team's roster to the members and maintainers the
//! chart assigns it.

use crate::error::{GhSyncError, GhSyncResult};
use crate::github::{GithubClient, RemoteTeam, TeamRole};
use crate::mutator::RemoteMutator;
use crate::report::{EmployeeRef, SyncReport};
use crate::snapshot::{RemoteSnapshot, TeamRoster, fetch_team_roster};
use orgchart::OrgChart;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Logins a team should have, each with its role. Maintainer wins over
/// member for a login listed as both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredRoster {
    pub roles: BTreeMap<String, TeamRole>
}

impl DesiredRoster {
    pub fn insert(&mut self, login: &str, role: TeamRole) {
        let entry = self.roles.entry(login.to_string()).or_insert(role);
        if role == TeamRole::Maintainer {
            *entry = TeamRole::Maintainer;
        }
    }

    pub fn maintainers(&self) -> impl Iterator<Item = &str> {
        self.with_role(TeamRole::Maintainer)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.with_role(TeamRole::Member)
    }

    fn with_role(&self, role: TeamRole) -> impl Iterator<Item = &str> {
        self.roles
            .iter()
            .filter(move |(_, r)| **r == role)
            .map(|(login, _)| login.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TeamMembership {
    pub team_id: String,
    pub remote: RemoteTeam,
    pub desired: DesiredRoster
}

/// Desired roster for every chart team, in chart order.
///
/// Employees and leads without a handle are recorded in `report` and
/// otherwise skipped; one missing handle never affects anyone else.
pub fn desired_memberships(
    chart: &OrgChart,
    snapshot: &RemoteSnapshot,
    report: &mut SyncReport
) -> GhSyncResult<Vec<TeamMembership>> {
    let mut memberships = Vec::with_capacity(chart.teams().len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(chart.teams().len());

    for team in chart.teams() {
        let remote = snapshot
            .team(&team.remote_name)
            .cloned()
            .ok_or_else(|| GhSyncError::TeamNotSynced {
                team: team.remote_name.clone()
            })?;

        index.insert(team.id.as_str(), memberships.len());
        memberships.push(TeamMembership {
            team_id: team.id.clone(),
            remote,
            desired: DesiredRoster::default()
        });
    }

    for employee in chart.employees() {
        let Some(handle) = employee.remote_handle() else {
            warn!(employee = %employee.id, team = %employee.member_of, "No github handle, cannot add member");
            report
                .unable_to_create_membership
                .push(EmployeeRef::new(employee, &employee.member_of));
            continue;
        };

        let idx = *index
            .get(employee.member_of.as_str())
            .ok_or_else(|| GhSyncError::UnknownTeam(employee.member_of.clone()))?;
        memberships[idx].desired.insert(handle, TeamRole::Member);
    }

    for (idx, team) in chart.teams().iter().enumerate() {
        let mut leads: Vec<&str> = Vec::with_capacity(2);
        leads.extend(team.tech_lead_id.as_deref());
        if team.product_lead_id != team.tech_lead_id {
            leads.extend(team.product_lead_id.as_deref());
        }

        for lead_id in leads {
            let lead = chart
                .employee(lead_id)
                .ok_or_else(|| GhSyncError::LeadNotFound {
                    lead_id: lead_id.to_string(),
                    team_id: team.id.clone()
                })?;

            match lead.remote_handle() {
                Some(handle) => memberships[idx].desired.insert(handle, TeamRole::Maintainer),
                None => {
                    warn!(employee = %lead.id, team = %team.id, "No github handle, cannot add maintainer");
                    report
                        .unable_to_create_maintainer
                        .push(EmployeeRef::new(lead, &team.id));
                }
            }
        }
    }

    Ok(memberships)
}

/// Membership calls that take a roster from `current` to `desired`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub removals: Vec<String>,
    pub additions: Vec<(String, TeamRole)>
}

impl MembershipPlan {
    pub fn between(current: &TeamRoster, desired: &DesiredRoster) -> Self {
        let removals = current
            .logins()
            .filter(|login| !desired.roles.contains_key(*login))
            .map(|login| login.to_string())
            .collect();

        // a login holding the wrong role is re-added; the call updates it
        let additions = desired
            .roles
            .iter()
            .filter(|(login, role)| current.role_of(login) != Some(**role))
            .map(|(login, role)| (login.clone(), *role))
            .collect();

        Self {
            removals,
            additions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }
}

pub struct MembershipReconciler<'a> {
    client: &'a dyn GithubClient,
    mutator: &'a dyn RemoteMutator
}

impl<'a> MembershipReconciler<'a> {
    pub fn new(client: &'a dyn GithubClient, mutator: &'a dyn RemoteMutator) -> Self {
        Self { client, mutator }
    }

    pub async fn reconcile_all(
        &self,
        memberships: &[TeamMembership],
        report: &mut SyncReport
    ) -> GhSyncResult<()> {
        for membership in memberships {
            self.reconcile_team(membership, report).await?;
        }
        Ok(())
    }

    /// Removes every unwanted login, then adds every missing one.
    pub async fn reconcile_team(
        &self,
        membership: &TeamMembership,
        report: &mut SyncReport
    ) -> GhSyncResult<MembershipPlan> {
        let team = &membership.remote;

        let current = if team.placeholder {
            TeamRoster::default()
        } else {
            fetch_team_roster(self.client, team).await?
        };

        let plan = MembershipPlan::between(&current, &membership.desired);

        for login in &plan.removals {
            debug!(team = %team.name, login = %login, "removing {} from {}", login, team.name);
            self.mutator
                .remove_membership(team, login)
                .await
                .map_err(|e| {
                    GhSyncError::mutation("remove membership of", format!("{} in {}", login, team.name), e)
                })?;
            report.memberships_removed += 1;
        }

        for (login, role) in &plan.additions {
            debug!(team = %team.name, login = %login, role = %role, "adding {} to {}", login, team.name);
            self.mutator
                .add_membership(team, login, *role)
                .await
                .map_err(|e| {
                    GhSyncError::mutation("add membership of", format!("{} in {}", login, team.name), e)
                })?;
            report.memberships_added += 1;
        }

        Ok(plan)
    }
}
