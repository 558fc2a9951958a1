use async_trait::async_trait;
use gh_sync::{
    GhSyncError, GhSyncResult, GithubClient, Page, RemoteTeam, RemoteUser, TeamParent, TeamRole,
    TeamSpec,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

const DEFAULT_PAGE_SIZE: usize = 2;
const FIRST_TEAM_ID: u64 = 1000;

/// One call received by [`FakeGithub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListMembers { page: Option<String> },
    ListTeams { page: Option<String> },
    ListTeamMembers { team_id: u64, role: TeamRole, page: Option<String> },
    CreateTeam { name: String, parent_id: Option<u64> },
    EditTeam { team_id: u64, name: String, parent_id: Option<u64> },
    DeleteTeam { team_id: u64 },
    AddMembership { team_id: u64, login: String, role: TeamRole },
    RemoveMembership { team_id: u64, login: String }
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Call::ListMembers { .. } | Call::ListTeams { .. } | Call::ListTeamMembers { .. }
        )
    }
}

type FailurePredicate = Box<dyn Fn(&Call) -> bool + Send + Sync>;

struct State {
    teams: BTreeMap<u64, RemoteTeam>,
    members: Vec<RemoteUser>,
    rosters: HashMap<u64, BTreeMap<String, TeamRole>>,
    calls: Vec<Call>,
    next_id: u64,
    page_size: usize,
    fail_when: Option<FailurePredicate>
}

/// A GitHub organisation held in memory.
///
/// Listing calls paginate with a small page size so every pagination loop
/// is exercised. Deleting a team deletes its child teams, as GitHub does.
pub struct FakeGithub {
    state: Mutex<State>
}

impl Default for FakeGithub {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGithub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                teams: BTreeMap::new(),
                members: Vec::new(),
                rosters: HashMap::new(),
                calls: Vec::new(),
                next_id: FIRST_TEAM_ID,
                page_size: DEFAULT_PAGE_SIZE,
                fail_when: None
            })
        }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state.lock().page_size = page_size.max(1);
        self
    }

    /// Every later call matching `predicate` fails with a 500.
    pub fn fail_when(&self, predicate: impl Fn(&Call) -> bool + Send + Sync + 'static) {
        self.state.lock().fail_when = Some(Box::new(predicate));
    }

    pub fn add_member(&self, login: &str) -> RemoteUser {
        let mut state = self.state.lock();
        let user = RemoteUser {
            id: state.members.len() as u64 + 1,
            login: login.to_string()
        };
        state.members.push(user.clone());
        user
    }

    /// Seeds a team without recording a call. `parent` must already exist.
    pub fn add_team(&self, name: &str, parent: Option<&str>) -> RemoteTeam {
        let mut state = self.state.lock();
        let parent = parent.and_then(|p| find_by_name(&state.teams, p).map(RemoteTeam::as_parent));
        let id = state.allocate_id();
        let team = RemoteTeam {
            id,
            name: name.to_string(),
            slug: name.to_string(),
            description: None,
            privacy: None,
            parent,
            placeholder: false
        };
        state.teams.insert(id, team.clone());
        team
    }

    pub fn set_roster(&self, team: &str, roster: &[(&str, TeamRole)]) {
        let mut state = self.state.lock();
        let Some(id) = find_by_name(&state.teams, team).map(|t| t.id) else {
            return;
        };
        state.rosters.insert(
            id,
            roster
                .iter()
                .map(|(login, role)| (login.to_string(), *role))
                .collect()
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn team_by_name(&self, name: &str) -> Option<RemoteTeam> {
        find_by_name(&self.state.lock().teams, name).cloned()
    }

    pub fn team_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .teams
            .values()
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn roster(&self, team: &str) -> BTreeMap<String, TeamRole> {
        let state = self.state.lock();
        find_by_name(&state.teams, team)
            .and_then(|t| state.rosters.get(&t.id))
            .cloned()
            .unwrap_or_default()
    }
}

impl State {
    /// Records `call`, failing it if the failure predicate matches.
    fn record(&mut self, call: Call) -> GhSyncResult<()> {
        let fails = self.fail_when.as_ref().is_some_and(|p| p(&call));
        self.calls.push(call);

        if fails {
            return Err(GhSyncError::GithubApiError {
                status: 500,
                message: "injected failure".to_string()
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn parent(&self, parent_id: Option<u64>) -> GhSyncResult<Option<TeamParent>> {
        match parent_id {
            None => Ok(None),
            Some(id) => self
                .teams
                .get(&id)
                .map(|t| Some(t.as_parent()))
                .ok_or_else(|| GhSyncError::GithubApiError {
                    status: 422,
                    message: format!("parent team {} does not exist", id)
                })
        }
    }

    fn user(&self, login: &str) -> RemoteUser {
        self.members
            .iter()
            .find(|m| m.login == login)
            .cloned()
            .unwrap_or_else(|| RemoteUser {
                id: 0,
                login: login.to_string()
            })
    }
}

fn find_by_name<'a>(teams: &'a BTreeMap<u64, RemoteTeam>, name: &str) -> Option<&'a RemoteTeam> {
    teams.values().find(|t| t.name == name)
}

fn paginate<T: Clone>(items: &[T], page: Option<&str>, page_size: usize) -> GhSyncResult<Page<T>> {
    let index: usize = match page {
        Some(page) => page.parse().map_err(|_| GhSyncError::GithubApiError {
            status: 400,
            message: format!("bad page cursor {}", page)
        })?,
        None => 1
    };

    let start = (index - 1) * page_size;
    let end = (start + page_size).min(items.len());
    let slice = items.get(start..end).unwrap_or_default().to_vec();
    let next_page = (end < items.len()).then(|| (index + 1).to_string());

    Ok(Page {
        items: slice,
        next_page
    })
}

#[async_trait]
impl GithubClient for FakeGithub {
    async fn list_members(&self, page: Option<&str>) -> GhSyncResult<Page<RemoteUser>> {
        let mut state = self.state.lock();
        state.record(
            Call::ListMembers {
                page: page.map(str::to_string)
            }
        )?;
        paginate(&state.members, page, state.page_size)
    }

    async fn list_teams(&self, page: Option<&str>) -> GhSyncResult<Page<RemoteTeam>> {
        let mut state = self.state.lock();
        state.record(
            Call::ListTeams {
                page: page.map(str::to_string)
            }
        )?;
        let teams: Vec<RemoteTeam> = state.teams.values().cloned().collect();
        paginate(&teams, page, state.page_size)
    }

    async fn list_team_members(
        &self,
        team_id: u64,
        role: TeamRole,
        page: Option<&str>
    ) -> GhSyncResult<Page<RemoteUser>> {
        let mut state = self.state.lock();
        state.record(
            Call::ListTeamMembers {
                team_id,
                role,
                page: page.map(str::to_string)
            }
        )?;

        if !state.teams.contains_key(&team_id) {
            return Err(GhSyncError::NotFound(format!("/teams/{}", team_id)));
        }

        let users: Vec<RemoteUser> = state
            .rosters
            .get(&team_id)
            .into_iter()
            .flatten()
            .filter(|(_, r)| **r == role)
            .map(|(login, _)| state.user(login))
            .collect();
        paginate(&users, page, state.page_size)
    }

    async fn create_team(&self, team: &TeamSpec) -> GhSyncResult<RemoteTeam> {
        let mut state = self.state.lock();
        state.record(
            Call::CreateTeam {
                name: team.name.clone(),
                parent_id: team.parent_team_id
            }
        )?;

        if find_by_name(&state.teams, &team.name).is_some() {
            return Err(GhSyncError::GithubApiError {
                status: 422,
                message: format!("team {} already exists", team.name)
            });
        }

        let parent = state.parent(team.parent_team_id)?;
        let id = state.allocate_id();
        let created = RemoteTeam {
            id,
            name: team.name.clone(),
            slug: team.name.clone(),
            description: Some(team.description.clone()),
            privacy: Some(team.privacy),
            parent,
            placeholder: false
        };
        state.teams.insert(id, created.clone());
        Ok(created)
    }

    async fn edit_team(&self, team_id: u64, team: &TeamSpec) -> GhSyncResult<RemoteTeam> {
        let mut state = self.state.lock();
        state.record(
            Call::EditTeam {
                team_id,
                name: team.name.clone(),
                parent_id: team.parent_team_id
            }
        )?;

        let parent = state.parent(team.parent_team_id)?;
        let existing = state
            .teams
            .get_mut(&team_id)
            .ok_or_else(|| GhSyncError::NotFound(format!("/teams/{}", team_id)))?;
        existing.description = Some(team.description.clone());
        existing.privacy = Some(team.privacy);
        existing.parent = parent;
        Ok(existing.clone())
    }

    async fn delete_team(&self, team_id: u64) -> GhSyncResult<()> {
        let mut state = self.state.lock();
        state.record(Call::DeleteTeam { team_id })?;

        if !state.teams.contains_key(&team_id) {
            return Err(GhSyncError::NotFound(format!("/teams/{}", team_id)));
        }

        let mut doomed: HashSet<u64> = HashSet::from([team_id]);
        loop {
            let children: Vec<u64> = state
                .teams
                .values()
                .filter(|t| !doomed.contains(&t.id))
                .filter(|t| t.parent.as_ref().is_some_and(|p| doomed.contains(&p.id)))
                .map(|t| t.id)
                .collect();
            if children.is_empty() {
                break;
            }
            doomed.extend(children);
        }

        for id in doomed {
            state.teams.remove(&id);
            state.rosters.remove(&id);
        }
        Ok(())
    }

    async fn add_team_membership(
        &self,
        team_id: u64,
        login: &str,
        role: TeamRole
    ) -> GhSyncResult<()> {
        let mut state = self.state.lock();
        state.record(
            Call::AddMembership {
                team_id,
                login: login.to_string(),
                role
            }
        )?;

        if !state.teams.contains_key(&team_id) {
            return Err(GhSyncError::NotFound(format!("/teams/{}", team_id)));
        }
        state
            .rosters
            .entry(team_id)
            .or_default()
            .insert(login.to_string(), role);
        Ok(())
    }

    async fn remove_team_membership(&self, team_id: u64, login: &str) -> GhSyncResult<()> {
        let mut state = self.state.lock();
        state.record(
            Call::RemoveMembership {
                team_id,
                login: login.to_string()
            }
        )?;

        let removed = state
            .rosters
            .get_mut(&team_id)
            .and_then(|roster| roster.remove(login));
        match removed {
            Some(_) => Ok(()),
            None => Err(GhSyncError::NotFound(format!(
                "/teams/{}/memberships/{}",
                team_id, login
            )))
        }
    }
}
