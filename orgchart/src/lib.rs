pub mod chart;
pub mod error;
pub mod export;
pub mod loader;
pub mod model;

pub use chart::{LeadKind, OrgChart, remote_team_name};
pub use error::{OrgChartError, OrgChartResult};
pub use export::{EmployeeExport, TeamExport, VacancyExport, write_csv, write_json_lines};
pub use loader::{ChartSource, CouchDbChartSource, FileChartSource, chart_source, load_chart};
pub use model::{ChartDocument, Employee, EmployeeType, Stream, Team, TeamKind};
