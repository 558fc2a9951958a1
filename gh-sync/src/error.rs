use thiserror::Error;

pub type GhSyncResult<T> = Result<T, GhSyncError>;

#[derive(Debug, Error)]
pub enum GhSyncError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("GitHub API error: {status} - {message}")]
    GithubApiError { status: u16, message: String },

    #[error("GitHub resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited: retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Org chart error: {0}")]
    Chart(#[from] orgchart::OrgChartError),

    #[error("Failed to fetch {resource}: {source}")]
    RemoteFetch {
        resource: String,
        #[source]
        source: Box<GhSyncError>
    },

    #[error("Failed to {operation} {target}: {source}")]
    Mutation {
        operation: String,
        target: String,
        #[source]
        source: Box<GhSyncError>
    },

    #[error("Could not find org team {0}")]
    UnknownTeam(String),

    #[error("Cyclic team hierarchy: {chain}")]
    CyclicHierarchy { chain: String },

    #[error("Could not find lead {lead_id} for team {team_id}")]
    LeadNotFound { lead_id: String, team_id: String },

    #[error("Team {team} not found in github")]
    TeamNotSynced { team: String }
}

impl GhSyncError {
    pub fn remote_fetch(resource: impl Into<String>, source: GhSyncError) -> Self {
        Self::RemoteFetch {
            resource: resource.into(),
            source: Box::new(source)
        }
    }

    pub fn mutation(
        operation: impl Into<String>,
        target: impl Into<String>,
        source: GhSyncError
    ) -> Self {
        Self::Mutation {
            operation: operation.into(),
            target: target.into(),
            source: Box::new(source)
        }
    }

    /// Whether re-running the sync later may succeed. Nothing retries
    /// automatically; this only shapes operator messaging.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::RateLimited { .. } => true,
            Self::GithubApiError { status, .. } => *status >= 500,
            Self::RemoteFetch { source, .. } | Self::Mutation { source, .. } => {
                source.is_retryable()
            }
            _ => false
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited {
                retry_after_seconds
            } => Some(*retry_after_seconds),
            Self::RemoteFetch { source, .. } | Self::Mutation { source, .. } => {
                source.retry_after()
            }
            _ => None
        }
    }
}
