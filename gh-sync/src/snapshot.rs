//! In-memory view of the organisation's remote state, and the collector that
//! fills it through the paginated listing calls.

use crate::error::{GhSyncError, GhSyncResult};
use crate::github::{GithubClient, RemoteTeam, RemoteUser, TeamRole};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Teams keyed by name plus the organisation's members.
///
/// Filled once by [`RemoteSnapshot::collect`], then updated in place as teams
/// are created, edited and removed, so later phases of the same run read
/// earlier writes.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    teams: BTreeMap<String, RemoteTeam>,
    members: Vec<RemoteUser>
}

impl RemoteSnapshot {
    pub fn new(teams: impl IntoIterator<Item = RemoteTeam>, members: Vec<RemoteUser>) -> Self {
        Self {
            teams: teams.into_iter().map(|t| (t.name.clone(), t)).collect(),
            members
        }
    }

    /// Every organisation member and every team named with `prefix`.
    ///
    /// Any failed page aborts the whole collection.
    pub async fn collect(client: &dyn GithubClient, prefix: &str) -> GhSyncResult<Self> {
        let members = fetch_all_members(client)
            .await
            .map_err(|e| GhSyncError::remote_fetch("organization members", e))?;
        info!(count = members.len(), "Fetched organization members from github");

        let teams: Vec<RemoteTeam> = fetch_all_teams(client)
            .await
            .map_err(|e| GhSyncError::remote_fetch("organization teams", e))?
            .into_iter()
            .filter(|t| t.name.starts_with(prefix))
            .collect();
        info!(count = teams.len(), prefix = %prefix, "Fetched managed teams from github");

        Ok(Self::new(teams, members))
    }

    pub fn teams(&self) -> impl Iterator<Item = &RemoteTeam> {
        self.teams.values()
    }

    pub fn team(&self, name: &str) -> Option<&RemoteTeam> {
        self.teams.get(name)
    }

    pub fn members(&self) -> &[RemoteUser] {
        &self.members
    }

    pub fn has_member(&self, login: &str) -> bool {
        self.members.iter().any(|m| m.login == login)
    }

    /// Inserts or replaces the team under its name.
    pub fn upsert_team(&mut self, team: RemoteTeam) {
        self.teams.insert(team.name.clone(), team);
    }

    /// Drops `name` and, because GitHub deletes child teams with their
    /// parent, every team whose parent chain passes through it. Returns the
    /// dropped descendants.
    pub fn remove_team(&mut self, name: &str) -> Vec<RemoteTeam> {
        if self.teams.remove(name).is_none() {
            return Vec::new();
        }

        let mut removed: HashSet<String> = HashSet::from([name.to_string()]);
        let mut descendants = Vec::new();

        loop {
            let orphans: Vec<String> = self
                .teams
                .values()
                .filter(|t| t.parent_name().is_some_and(|p| removed.contains(p)))
                .map(|t| t.name.clone())
                .collect();

            if orphans.is_empty() {
                break;
            }

            for orphan in orphans {
                if let Some(team) = self.teams.remove(&orphan) {
                    debug!(team = %orphan, parent = ?team.parent_name(), "Dropping child of removed team");
                    removed.insert(orphan);
                    descendants.push(team);
                }
            }
        }

        descendants
    }
}

/// Current maintainers and members of one remote team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRoster {
    pub roles: BTreeMap<String, TeamRole>
}

impl TeamRoster {
    pub fn role_of(&self, login: &str) -> Option<TeamRole> {
        self.roles.get(login).copied()
    }

    pub fn logins(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(|l| l.as_str())
    }
}

/// Role-tagged roster of `team`. Maintainers are read first; a login listed
/// under both roles is a maintainer.
pub async fn fetch_team_roster(client: &dyn GithubClient, team: &RemoteTeam) -> GhSyncResult<TeamRoster> {
    let mut roster = TeamRoster::default();

    for role in [TeamRole::Maintainer, TeamRole::Member] {
        let users = fetch_all_team_members(client, team.id, role)
            .await
            .map_err(|e| GhSyncError::remote_fetch(format!("{} of team {}", role, team.name), e))?;

        for user in users {
            roster.roles.entry(user.login).or_insert(role);
        }
    }

    Ok(roster)
}

async fn fetch_all_members(client: &dyn GithubClient) -> GhSyncResult<Vec<RemoteUser>> {
    let mut all_members = Vec::new();
    let mut page: Option<String> = None;

    loop {
        let result = client.list_members(page.as_deref()).await?;
        all_members.extend(result.items);
        page = result.next_page;

        if page.is_none() {
            break;
        }
    }

    Ok(all_members)
}

async fn fetch_all_teams(client: &dyn GithubClient) -> GhSyncResult<Vec<RemoteTeam>> {
    let mut all_teams = Vec::new();
    let mut page: Option<String> = None;

    loop {
        let result = client.list_teams(page.as_deref()).await?;
        all_teams.extend(result.items);
        page = result.next_page;

        if page.is_none() {
            break;
        }
    }

    Ok(all_teams)
}

async fn fetch_all_team_members(
    client: &dyn GithubClient,
    team_id: u64,
    role: TeamRole
) -> GhSyncResult<Vec<RemoteUser>> {
    let mut all_members = Vec::new();
    let mut page: Option<String> = None;

    loop {
        let result = client
            .list_team_members(team_id, role, page.as_deref())
            .await?;
        all_members.extend(result.items);
        page = result.next_page;

        if page.is_none() {
            break;
        }
    }

    Ok(all_members)
}
