pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod github;
pub mod materialize;
pub mod membership;
pub mod mutator;
pub mod report;
pub mod snapshot;
pub mod sync;

pub use config::GhSyncConfig;
pub use context::SyncContext;
pub use diff::{ChartEntity, Drift, diff};
pub use error::{GhSyncError, GhSyncResult};
pub use github::{
    GithubClient, Page, RemoteTeam, RemoteUser, RestGithubClient, TeamParent, TeamPrivacy,
    TeamRole, TeamSpec, create_github_client,
};
pub use materialize::TeamMaterializer;
pub use membership::{DesiredRoster, MembershipPlan, MembershipReconciler, TeamMembership};
pub use mutator::{DryRunMutator, LiveMutator, RemoteMutator, mutator_for};
pub use report::{EmployeeRef, SyncReport, TeamChange};
pub use snapshot::{RemoteSnapshot, TeamRoster, fetch_team_roster};
pub use sync::{GhSyncService, SyncFailure, SyncOutcome, SyncPhase};
