//! Classification of differences between the org chart and the remote
//! snapshot. Pure: reads both sides, changes neither.

use crate::github::{RemoteTeam, RemoteUser};
use crate::snapshot::RemoteSnapshot;
use orgchart::OrgChart;
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// A desired team or employee, by id and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartEntity {
    pub id: String,
    pub name: String,
    /// Remote team name or platform handle.
    pub remote: String
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Drift {
    /// Desired teams whose remote name is absent from the snapshot.
    pub teams_not_in_remote: Vec<ChartEntity>,
    /// Snapshot teams no desired team maps to; removal candidates.
    pub teams_only_in_remote: Vec<RemoteTeam>,
    /// Employees with a handle that is not an organisation member.
    pub employees_not_in_remote: Vec<ChartEntity>,
    /// Organisation members no employee claims as a handle.
    pub remote_users_not_in_model: Vec<RemoteUser>
}

impl Drift {
    pub fn is_empty(&self) -> bool {
        self.teams_not_in_remote.is_empty()
            && self.teams_only_in_remote.is_empty()
            && self.employees_not_in_remote.is_empty()
            && self.remote_users_not_in_model.is_empty()
    }

    /// One log line per detected difference.
    pub fn log(&self) {
        for user in &self.remote_users_not_in_model {
            info!(login = %user.login, "github user {} not found in orgchart", user.login);
        }

        for employee in &self.employees_not_in_remote {
            info!(
                employee = %employee.id,
                "employee {} ({}) not found in github, will be added",
                employee.name,
                employee.remote
            );
        }

        for team in &self.teams_only_in_remote {
            info!(team = %team.name, "github team {} not found in orgchart, will be removed", team.name);
        }

        for team in &self.teams_not_in_remote {
            info!(
                team = %team.id,
                "team {} ({}) not found in github, will be added",
                team.name,
                team.remote
            );
        }
    }
}

/// Compares the chart against the snapshot. Names and handles match exactly,
/// case included. The chart must carry remote names.
pub fn diff(chart: &OrgChart, snapshot: &RemoteSnapshot) -> Drift {
    let desired_team_names: HashSet<&str> = chart
        .teams()
        .iter()
        .map(|t| t.remote_name.as_str())
        .collect();

    let desired_handles: HashSet<&str> = chart
        .employees()
        .iter()
        .filter_map(|e| e.remote_handle())
        .collect();

    let remote_logins: HashSet<&str> = snapshot
        .members()
        .iter()
        .map(|m| m.login.as_str())
        .collect();

    let teams_not_in_remote = chart
        .teams()
        .iter()
        .filter(|t| snapshot.team(&t.remote_name).is_none())
        .map(|t| ChartEntity {
            id: t.id.clone(),
            name: t.name.clone(),
            remote: t.remote_name.clone()
        })
        .collect();

    let teams_only_in_remote = snapshot
        .teams()
        .filter(|t| !desired_team_names.contains(t.name.as_str()))
        .cloned()
        .collect();

    let employees_not_in_remote = chart
        .employees()
        .iter()
        .filter_map(|e| e.remote_handle().map(|handle| (e, handle)))
        .filter(|(_, handle)| !remote_logins.contains(handle))
        .map(|(e, handle)| ChartEntity {
            id: e.id.clone(),
            name: e.name.clone(),
            remote: handle.to_string()
        })
        .collect();

    let remote_users_not_in_model = snapshot
        .members()
        .iter()
        .filter(|m| !desired_handles.contains(m.login.as_str()))
        .cloned()
        .collect();

    Drift {
        teams_not_in_remote,
        teams_only_in_remote,
        employees_not_in_remote,
        remote_users_not_in_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::TeamParent;
    use orgchart::{Employee, Team};

    fn remote_team(id: u64, name: &str, parent: Option<&str>) -> RemoteTeam {
        RemoteTeam {
            id,
            name: name.to_string(),
            slug: name.to_string(),
            description: None,
            privacy: None,
            parent: parent.map(|p| TeamParent {
                id: 1,
                name: p.to_string()
            }),
            placeholder: false
        }
    }

    fn user(id: u64, login: &str) -> RemoteUser {
        RemoteUser {
            id,
            login: login.to_string()
        }
    }

    fn chart() -> OrgChart {
        let mut chart = OrgChart::new(
            vec![
                Team::new("tech", "Tech"),
                Team::new("platform", "Platform").with_parent("tech"),
            ],
            vec![
                Employee::new("ann", "Ann", "tech").with_handle("ann-gh"),
                Employee::new("bob", "Bob", "platform").with_handle("Bob-GH"),
                Employee::new("cy", "Cy", "platform"),
            ]
        )
        .unwrap();
        chart.assign_remote_names("org-").unwrap();
        chart
    }

    #[test]
    fn test_diff_classifies_all_four_sets() {
        let snapshot = RemoteSnapshot::new(
            vec![remote_team(1, "org-tech", None), remote_team(2, "org-legacy", None)],
            vec![user(10, "ann-gh"), user(11, "bob-gh"), user(12, "stranger")]
        );

        let drift = diff(&chart(), &snapshot);

        assert_eq!(drift.teams_not_in_remote.len(), 1);
        assert_eq!(drift.teams_not_in_remote[0].remote, "org-platform");

        assert_eq!(drift.teams_only_in_remote.len(), 1);
        assert_eq!(drift.teams_only_in_remote[0].name, "org-legacy");

        // handle matching is case sensitive
        assert_eq!(drift.employees_not_in_remote.len(), 1);
        assert_eq!(drift.employees_not_in_remote[0].id, "bob");

        let logins: Vec<&str> = drift
            .remote_users_not_in_model
            .iter()
            .map(|u| u.login.as_str())
            .collect();
        assert_eq!(logins, vec!["bob-gh", "stranger"]);
    }

    #[test]
    fn test_converged_state_has_no_drift() {
        let snapshot = RemoteSnapshot::new(
            vec![
                remote_team(1, "org-tech", None),
                remote_team(2, "org-platform", Some("org-tech")),
            ],
            vec![user(10, "ann-gh"), user(11, "Bob-GH")]
        );

        let drift = diff(&chart(), &snapshot);
        assert!(drift.is_empty());
    }

    #[test]
    fn test_diff_does_not_touch_the_snapshot() {
        let snapshot = RemoteSnapshot::new(vec![remote_team(2, "org-legacy", None)], vec![]);
        let before = format!("{:?}", snapshot);

        let first = diff(&chart(), &snapshot);
        let second = diff(&chart(), &snapshot);

        assert_eq!(format!("{:?}", snapshot), before);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
