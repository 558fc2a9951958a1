use crate::error::{GhSyncError, GhSyncResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_TEAM_PREFIX: &str = "org-";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Settings for one GitHub sync run.
///
/// ## Fields
/// - `organization`: GitHub organisation login (required)
/// - `token`: token with `admin:org` scope (required)
/// - `team_prefix`: only teams whose name starts with it are managed
///   (default: "org-")
/// - `api_url`: REST API root (default: "https://api.github.com")
/// - `per_page`: page size for listing calls (default: 100, range: 1-100)
/// - `timeout_seconds`: per-request timeout (default: 30, range: 1-300)
/// - `dry_run`: decide everything, mutate nothing
/// - `skip_members`: stop after teams are materialized
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct GhSyncConfig {
    #[validate(length(min = 1, max = 39))]
    pub organization: String,

    #[validate(length(min = 1))]
    pub token: String,

    #[serde(default = "default_team_prefix")]
    #[validate(length(min = 1, max = 64))]
    pub team_prefix: String,

    #[serde(default = "default_api_url")]
    #[validate(url)]
    pub api_url: String,

    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: u32,

    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub skip_members: bool
}

fn default_team_prefix() -> String {
    DEFAULT_TEAM_PREFIX.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for GhSyncConfig {
    fn default() -> Self {
        Self {
            organization: String::new(),
            token: String::new(),
            team_prefix: default_team_prefix(),
            api_url: default_api_url(),
            per_page: default_per_page(),
            timeout_seconds: default_timeout_seconds(),
            dry_run: false,
            skip_members: false
        }
    }
}

impl std::fmt::Debug for GhSyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhSyncConfig")
            .field("organization", &self.organization)
            .field("token", &"<redacted>")
            .field("team_prefix", &self.team_prefix)
            .field("api_url", &self.api_url)
            .field("per_page", &self.per_page)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("dry_run", &self.dry_run)
            .field("skip_members", &self.skip_members)
            .finish()
    }
}

impl GhSyncConfig {
    pub fn new(organization: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn check(&self) -> GhSyncResult<()> {
        self.validate()
            .map_err(|e| GhSyncError::ConfigError(e.to_string()))
    }
}
