//! Flattened, one-row-per-entity views of the chart for reporting sinks.

use crate::chart::OrgChart;
use crate::error::OrgChartResult;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Streams vacancy rows are reported for.
pub const VACANCY_STREAMS: [&str; 5] = ["engineering", "product", "operations", "portfolio", "design"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeExport {
    pub id: String,
    pub name: String,
    pub stream: String,
    #[serde(rename = "type")]
    pub employee_type: String,
    pub team: String,
    pub reporting: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamExport {
    pub id: String,
    pub name: String,
    pub parents: String,
    #[serde(rename = "techLead")]
    pub tech_lead_id: String,
    #[serde(rename = "productLead")]
    pub product_lead_id: String
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VacancyType {
    New,
    Backfill
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancyExport {
    #[serde(rename = "type")]
    pub vacancy_type: VacancyType,
    #[serde(rename = "team")]
    pub team_id: String,
    pub stream: String,
    pub count: u32
}

impl OrgChart {
    pub fn employee_exports(&self) -> OrgChartResult<Vec<EmployeeExport>> {
        self.employees()
            .iter()
            .map(|employee| {
                let team = self
                    .team(&employee.member_of)
                    .ok_or_else(|| crate::OrgChartError::TeamNotFound(employee.member_of.clone()))?;

                Ok(EmployeeExport {
                    id: employee.id.clone(),
                    name: employee.name.clone(),
                    stream: employee.stream.as_ref().map(ToString::to_string).unwrap_or_default(),
                    employee_type: employee.employee_type.to_string(),
                    team: self.team_ancestry(team, true)?,
                    reporting: self.reporting_line(employee)?
                })
            })
            .collect()
    }

    pub fn team_exports(&self) -> OrgChartResult<Vec<TeamExport>> {
        self.teams()
            .iter()
            .map(|team| {
                Ok(TeamExport {
                    id: team.id.clone(),
                    name: team.name.clone(),
                    parents: self.team_ancestry(team, false)?,
                    tech_lead_id: self.tech_lead(team)?.map(|e| e.id.clone()).unwrap_or_default(),
                    product_lead_id: self
                        .product_lead(team)?
                        .map(|e| e.id.clone())
                        .unwrap_or_default()
                })
            })
            .collect()
    }

    pub fn vacancy_exports(&self) -> Vec<VacancyExport> {
        let mut rows = Vec::new();

        for team in self.teams() {
            for stream in VACANCY_STREAMS {
                let vacancies = self.vacancies(team, Some(stream));
                if vacancies > 0 {
                    rows.push(VacancyExport {
                        vacancy_type: VacancyType::New,
                        team_id: team.id.clone(),
                        stream: stream.to_string(),
                        count: vacancies
                    });
                }

                let backfills = self.backfills(team, Some(stream));
                if backfills > 0 {
                    rows.push(VacancyExport {
                        vacancy_type: VacancyType::Backfill,
                        team_id: team.id.clone(),
                        stream: stream.to_string(),
                        count: backfills
                    });
                }
            }
        }

        rows
    }
}

/// Writes one JSON document per line.
pub fn write_json_lines<W: Write, T: Serialize>(mut writer: W, rows: &[T]) -> OrgChartResult<()> {
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes rows as CSV with a header line.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> OrgChartResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Employee, EmployeeType, Stream, Team};

    fn chart() -> OrgChart {
        let mut platform = Team::new("platform", "Platform")
            .with_parent("tech")
            .with_tech_lead("ann");
        platform.vacancies.insert("ENGINEERING".to_string(), 2);
        platform.backfills.insert("Design".to_string(), 1);

        OrgChart::new(
            vec![Team::new("tech", "Tech").with_product_lead("cpo"), platform],
            vec![
                Employee::new("cpo", "Cpo", "tech").with_stream(Stream::Product),
                Employee::new("ann", "Ann", "platform").with_stream(Stream::Engineering),
            ]
        )
        .unwrap()
        .with_root_employee("cpo")
    }

    #[test]
    fn test_employee_exports() {
        let rows = chart().employee_exports().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, "ann");
        assert_eq!(rows[1].team, "tech::platform");
        assert_eq!(rows[1].stream, "ENGINEERING");
        assert_eq!(rows[1].employee_type, "EMPLOYEE");
        // no tech lead above platform, so the root employee
        assert_eq!(rows[1].reporting, "cpo");
        assert_eq!(rows[0].reporting, "");
    }

    #[test]
    fn test_employee_exports_keep_unrecognised_values() {
        let mut employee = Employee::new("mo", "Mo", "tech").with_stream(Stream::from("MARKETING".to_string()));
        employee.employee_type = EmployeeType::from("INTERN".to_string());
        let chart = OrgChart::new(vec![Team::new("tech", "Tech")], vec![employee]).unwrap();

        let rows = chart.employee_exports().unwrap();
        assert_eq!(rows[0].stream, "MARKETING");
        assert_eq!(rows[0].employee_type, "INTERN");
    }

    #[test]
    fn test_team_exports_inherit_leads() {
        let rows = chart().team_exports().unwrap();

        let platform = rows.iter().find(|r| r.id == "platform").unwrap();
        assert_eq!(platform.parents, "tech");
        assert_eq!(platform.tech_lead_id, "ann");
        assert_eq!(platform.product_lead_id, "cpo");

        let tech = rows.iter().find(|r| r.id == "tech").unwrap();
        assert_eq!(tech.parents, "");
        assert_eq!(tech.tech_lead_id, "cpo");
    }

    #[test]
    fn test_vacancy_exports() {
        let rows = chart().vacancy_exports();

        assert_eq!(
            rows,
            vec![
                VacancyExport {
                    vacancy_type: VacancyType::New,
                    team_id: "platform".to_string(),
                    stream: "engineering".to_string(),
                    count: 2
                },
                VacancyExport {
                    vacancy_type: VacancyType::Backfill,
                    team_id: "platform".to_string(),
                    stream: "design".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_writers() {
        let rows = chart().team_exports().unwrap();

        let mut json = Vec::new();
        write_json_lines(&mut json, &rows).unwrap();
        let json = String::from_utf8(json).unwrap();
        assert_eq!(json.lines().count(), 2);
        assert!(json.contains("\"techLead\":\"ann\""));

        let mut csv_out = Vec::new();
        write_csv(&mut csv_out, &rows).unwrap();
        let csv_out = String::from_utf8(csv_out).unwrap();
        assert!(csv_out.starts_with("id,name,parents,techLead,productLead\n"));
        assert!(csv_out.contains("platform,Platform,tech,ann,cpo"));
    }
}
