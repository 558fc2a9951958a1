use thiserror::Error;

pub type OrgChartResult<T> = Result<T, OrgChartError>;

#[derive(Debug, Error)]
pub enum OrgChartError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Chart store error: {status} - {message}")]
    StoreError { status: u16, message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid chart location: {0}")]
    InvalidLocation(String),

    #[error("Duplicate team id: {0}")]
    DuplicateTeam(String),

    #[error("Duplicate employee id: {0}")]
    DuplicateEmployee(String),

    #[error("Could not find team {team_id} for member {employee}")]
    UnknownTeamForEmployee { team_id: String, employee: String },

    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    #[error("Cyclic team hierarchy: {chain}")]
    CyclicHierarchy { chain: String },

    #[error("Cyclic reporting line: {chain}")]
    CyclicReportingLine { chain: String },

    #[error("Teams {first} and {second} both map to remote team {name}")]
    RemoteNameCollision {
        name: String,
        first: String,
        second: String
    }
}
