//! The only path by which a sync changes GitHub.
//!
//! Materialization and membership reconciliation are written once against
//! [`RemoteMutator`]; whether a run is live or dry is decided by which
//! implementation is injected.

use crate::error::GhSyncResult;
use crate::github::{GithubClient, RemoteTeam, TeamRole, TeamSpec};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[async_trait]
pub trait RemoteMutator: Send + Sync {
    /// Creates a team under `parent` (already materialized).
    async fn create_team(&self, spec: &TeamSpec, parent: Option<&RemoteTeam>) -> GhSyncResult<RemoteTeam>;

    /// Applies `spec` to `existing`, returning the handle to keep.
    async fn edit_team(
        &self,
        existing: &RemoteTeam,
        spec: &TeamSpec,
        parent: Option<&RemoteTeam>
    ) -> GhSyncResult<RemoteTeam>;

    async fn delete_team(&self, team: &RemoteTeam) -> GhSyncResult<()>;

    async fn add_membership(&self, team: &RemoteTeam, login: &str, role: TeamRole) -> GhSyncResult<()>;

    async fn remove_membership(&self, team: &RemoteTeam, login: &str) -> GhSyncResult<()>;
}

/// Forwards every mutation to GitHub.
pub struct LiveMutator {
    client: Arc<dyn GithubClient>
}

impl LiveMutator {
    pub fn new(client: Arc<dyn GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteMutator for LiveMutator {
    async fn create_team(&self, spec: &TeamSpec, _parent: Option<&RemoteTeam>) -> GhSyncResult<RemoteTeam> {
        self.client.create_team(spec).await
    }

    async fn edit_team(
        &self,
        existing: &RemoteTeam,
        spec: &TeamSpec,
        _parent: Option<&RemoteTeam>
    ) -> GhSyncResult<RemoteTeam> {
        self.client.edit_team(existing.id, spec).await
    }

    async fn delete_team(&self, team: &RemoteTeam) -> GhSyncResult<()> {
        self.client.delete_team(team.id).await
    }

    async fn add_membership(&self, team: &RemoteTeam, login: &str, role: TeamRole) -> GhSyncResult<()> {
        self.client.add_team_membership(team.id, login, role).await
    }

    async fn remove_membership(&self, team: &RemoteTeam, login: &str) -> GhSyncResult<()> {
        self.client.remove_team_membership(team.id, login).await
    }
}

/// Placeholder ids count down from here, well clear of real team ids.
pub const PLACEHOLDER_ID_BASE: u64 = u64::MAX;

/// Issues nothing. Created teams get a locally unique placeholder id so the
/// rest of the run can treat them like real ones; edited teams keep their
/// current handle.
pub struct DryRunMutator {
    next_placeholder_id: AtomicU64
}

impl DryRunMutator {
    pub fn new() -> Self {
        Self {
            next_placeholder_id: AtomicU64::new(PLACEHOLDER_ID_BASE)
        }
    }
}

impl Default for DryRunMutator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteMutator for DryRunMutator {
    async fn create_team(&self, spec: &TeamSpec, parent: Option<&RemoteTeam>) -> GhSyncResult<RemoteTeam> {
        let id = self.next_placeholder_id.fetch_sub(1, Ordering::Relaxed);
        debug!(team = %spec.name, placeholder_id = id, "dry run: not creating team");

        Ok(RemoteTeam {
            id,
            name: spec.name.clone(),
            slug: spec.name.clone(),
            description: Some(spec.description.clone()),
            privacy: Some(spec.privacy),
            parent: parent.map(RemoteTeam::as_parent),
            placeholder: true
        })
    }

    async fn edit_team(
        &self,
        existing: &RemoteTeam,
        _spec: &TeamSpec,
        _parent: Option<&RemoteTeam>
    ) -> GhSyncResult<RemoteTeam> {
        debug!(team = %existing.name, "dry run: not editing team");
        Ok(existing.clone())
    }

    async fn delete_team(&self, team: &RemoteTeam) -> GhSyncResult<()> {
        debug!(team = %team.name, "dry run: not deleting team");
        Ok(())
    }

    async fn add_membership(&self, team: &RemoteTeam, login: &str, role: TeamRole) -> GhSyncResult<()> {
        debug!(team = %team.name, login = %login, role = %role, "dry run: not adding membership");
        Ok(())
    }

    async fn remove_membership(&self, team: &RemoteTeam, login: &str) -> GhSyncResult<()> {
        debug!(team = %team.name, login = %login, "dry run: not removing membership");
        Ok(())
    }
}

/// The mutator a run with `dry_run` should use.
pub fn mutator_for(client: Arc<dyn GithubClient>, dry_run: bool) -> Arc<dyn RemoteMutator> {
    if dry_run {
        Arc::new(DryRunMutator::new())
    } else {
        Arc::new(LiveMutator::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::TeamPrivacy;

    fn spec(name: &str) -> TeamSpec {
        TeamSpec {
            name: name.to_string(),
            description: "desc".to_string(),
            privacy: TeamPrivacy::Closed,
            parent_team_id: None
        }
    }

    #[tokio::test]
    async fn test_dry_run_create_synthesizes_unique_placeholders() {
        let mutator = DryRunMutator::new();

        let root = mutator.create_team(&spec("org-root"), None).await.unwrap();
        let child = mutator
            .create_team(&spec("org-child"), Some(&root))
            .await
            .unwrap();

        assert!(root.placeholder && child.placeholder);
        assert_ne!(root.id, child.id);
        assert_eq!(child.parent_name(), Some("org-root"));
        assert_eq!(child.parent.as_ref().unwrap().id, root.id);
        assert_eq!(child.privacy, Some(TeamPrivacy::Closed));
    }

    #[tokio::test]
    async fn test_dry_run_edit_returns_existing_handle() {
        let mutator = DryRunMutator::new();
        let existing = RemoteTeam {
            id: 7,
            name: "org-team".to_string(),
            slug: "org-team".to_string(),
            description: None,
            privacy: Some(TeamPrivacy::Secret),
            parent: None,
            placeholder: false
        };

        let edited = mutator
            .edit_team(&existing, &spec("org-team"), None)
            .await
            .unwrap();
        assert_eq!(edited, existing);
    }
}
