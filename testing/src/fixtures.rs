use gh_sync::GhSyncConfig;
use gh_sync::config::DEFAULT_TEAM_PREFIX;
use orgchart::{Employee, OrgChart, Team};

/// Indexes `teams` and `employees` and derives remote names with the
/// default prefix.
pub fn chart(teams: Vec<Team>, employees: Vec<Employee>) -> OrgChart {
    let mut chart = match OrgChart::new(teams, employees) {
        Ok(chart) => chart,
        Err(e) => panic!("fixture chart is invalid: {}", e)
    };
    if let Err(e) = chart.assign_remote_names(DEFAULT_TEAM_PREFIX) {
        panic!("fixture chart has colliding team names: {}", e);
    }
    chart
}

/// `root` > `platform` > `storage`, with no employees.
pub fn team_chain() -> OrgChart {
    chart(
        vec![
            Team::new("root", "Root"),
            Team::new("platform", "Platform").with_parent("root"),
            Team::new("storage", "Storage").with_parent("platform"),
        ],
        vec![]
    )
}

/// A small organisation with leads, members and one employee without a
/// handle.
///
/// - `tech` (tech lead ann)
///   - `platform_eng` (tech lead bob, product lead pam)
///   - `data` (tech lead ann)
pub fn sample_chart() -> OrgChart {
    chart(
        vec![
            Team::new("tech", "Technology")
                .with_description("All of engineering")
                .with_tech_lead("ann"),
            Team::new("platform_eng", "Platform Engineering")
                .with_parent("tech")
                .with_tech_lead("bob")
                .with_product_lead("pam"),
            Team::new("data", "Data")
                .with_parent("tech")
                .with_tech_lead("ann"),
        ],
        vec![
            Employee::new("ann", "Ann Lee", "tech").with_handle("ann-gh"),
            Employee::new("bob", "Bob Stone", "platform_eng").with_handle("bob-gh"),
            Employee::new("pam", "Pam Ray", "platform_eng").with_handle("pam-gh"),
            Employee::new("cy", "Cy Young", "platform_eng").with_handle("cy-gh"),
            Employee::new("dee", "Dee Moss", "data"),
            Employee::new("eve", "Eve Hart", "data").with_handle("eve-gh"),
        ]
    )
}

/// Handles of [`sample_chart`] employees.
pub const SAMPLE_HANDLES: [&str; 5] = ["ann-gh", "bob-gh", "pam-gh", "cy-gh", "eve-gh"];

pub fn sync_config(dry_run: bool) -> GhSyncConfig {
    GhSyncConfig {
        dry_run,
        ..GhSyncConfig::new("acme", "test-token")
    }
}

/// The stored chart document behind [`sample_chart`], as CouchDB returns it.
pub fn sample_document() -> serde_json::Value {
    serde_json::json!({
        "_id": "chart",
        "_rev": "12-abc",
        "rootEmployee": "ann",
        "teams": [
            {
                "id": "tech",
                "name": "Technology",
                "kind": "TRIBE",
                "description": "All of engineering",
                "techLead": "ann",
                "vacancies": {"ENGINEERING": 1}
            },
            {
                "id": "platform_eng",
                "name": "Platform Engineering",
                "kind": "TEAM",
                "parent": "tech",
                "techLead": "bob",
                "productLead": "pam",
                "backfills": {"PRODUCT": 1}
            },
            {
                "id": "data",
                "name": "Data",
                "kind": "TEAM",
                "parent": "tech",
                "techLead": "ann"
            }
        ],
        "employees": [
            {"id": "ann", "name": "Ann Lee", "github": "ann-gh", "memberOf": "tech", "stream": "ENGINEERING"},
            {"id": "bob", "name": "Bob Stone", "github": "bob-gh", "memberOf": "platform_eng", "stream": "ENGINEERING"},
            {"id": "pam", "name": "Pam Ray", "github": "pam-gh", "memberOf": "platform_eng", "stream": "PRODUCT"},
            {"id": "cy", "name": "Cy Young", "github": "cy-gh", "memberOf": "platform_eng", "stream": "ENGINEERING"},
            {"id": "dee", "name": "Dee Moss", "github": "", "memberOf": "data", "stream": "DATA"},
            {"id": "eve", "name": "Eve Hart", "github": "eve-gh", "memberOf": "data", "stream": "DATA", "type": "CONTRACTOR"}
        ]
    })
}
