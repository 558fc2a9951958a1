use crate::github::RemoteTeam;
use chrono::{DateTime, Utc};
use orgchart::Employee;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What a sync run did, or in a dry run would have done.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub created_teams: Vec<TeamChange>,
    pub reparented_teams: Vec<TeamChange>,
    pub removed_teams: Vec<TeamChange>,
    pub unable_to_create_membership: Vec<EmployeeRef>,
    pub unable_to_create_maintainer: Vec<EmployeeRef>,
    pub memberships_added: u32,
    pub memberships_removed: u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChange {
    pub id: u64,
    pub name: String,
    pub parent: Option<String>
}

impl From<&RemoteTeam> for TeamChange {
    fn from(team: &RemoteTeam) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            parent: team.parent_name().map(|p| p.to_string())
        }
    }
}

/// An employee the sync could not act on, and the team involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRef {
    pub id: String,
    pub name: String,
    pub team_id: String
}

impl EmployeeRef {
    pub fn new(employee: &Employee, team_id: &str) -> Self {
        Self {
            id: employee.id.clone(),
            name: employee.name.clone(),
            team_id: team_id.to_string()
        }
    }
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            dry_run,
            ..Default::default()
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// No team was created, reparented or removed.
    pub fn is_empty_change_set(&self) -> bool {
        self.created_teams.is_empty()
            && self.reparented_teams.is_empty()
            && self.removed_teams.is_empty()
    }

    pub fn created_team_names(&self) -> Vec<&str> {
        self.created_teams.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn removed_team_names(&self) -> Vec<&str> {
        self.removed_teams.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn reparented_team_names(&self) -> Vec<&str> {
        self.reparented_teams.iter().map(|t| t.name.as_str()).collect()
    }

    /// One log line per change and per employee that could not be synced.
    pub fn log(&self) {
        for team in &self.created_teams {
            info!(team = %team.name, "created {} in github", team.name);
        }

        for team in &self.reparented_teams {
            info!(team = %team.name, "reparented {} in github", team.name);
        }

        for team in &self.removed_teams {
            info!(team = %team.name, "removed {} from github", team.name);
        }

        for employee in &self.unable_to_create_membership {
            warn!(
                employee = %employee.id,
                "unable to add member {} to {} team, github handle not provided",
                employee.name,
                employee.team_id
            );
        }

        for employee in &self.unable_to_create_maintainer {
            warn!(
                employee = %employee.id,
                "unable to add maintainer {} to {} team, github handle not provided",
                employee.name,
                employee.team_id
            );
        }

        info!(
            created = self.created_teams.len(),
            reparented = self.reparented_teams.len(),
            removed = self.removed_teams.len(),
            memberships_added = self.memberships_added,
            memberships_removed = self.memberships_removed,
            dry_run = self.dry_run,
            "Sync completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_report() {
        let mut report = SyncReport::new(true);
        assert!(report.completed_at.is_none());
        assert!(report.is_empty_change_set());
        assert!(report.dry_run);

        report.removed_teams.push(TeamChange {
            id: 3,
            name: "org-legacy".to_string(),
            parent: None
        });
        assert!(!report.is_empty_change_set());
        assert_eq!(report.removed_team_names(), vec!["org-legacy"]);

        report.complete();
        assert!(report.completed_at.is_some());
    }

    #[test]
    fn test_membership_shortfalls_do_not_count_as_changes() {
        let mut report = SyncReport::new(false);
        report.unable_to_create_membership.push(EmployeeRef {
            id: "bob".to_string(),
            name: "Bob".to_string(),
            team_id: "tech".to_string()
        });
        report.memberships_added = 2;
        assert!(report.is_empty_change_set());
    }

    #[test]
    fn test_report_serialization() {
        let mut report = SyncReport::new(false);
        report.created_teams.push(TeamChange {
            id: 1,
            name: "org-tech".to_string(),
            parent: None
        });

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("org-tech"));
        assert!(json.contains("created_teams"));
    }
}
