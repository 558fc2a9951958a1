//! The indexed desired-state model.
//!
//! An [`OrgChart`] is built once from the stored document and is immutable
//! afterwards, apart from the remote names derived by
//! [`OrgChart::assign_remote_names`].

use crate::error::{OrgChartError, OrgChartResult};
use crate::model::{ChartDocument, Employee, Stream, Team};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Which of a team's two leads to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadKind {
    Tech,
    Product
}

impl Team {
    pub fn lead_id(&self, kind: LeadKind) -> Option<&str> {
        match kind {
            LeadKind::Tech => self.tech_lead_id.as_deref(),
            LeadKind::Product => self.product_lead_id.as_deref()
        }
    }
}

/// Name a team carries on the collaboration platform.
pub fn remote_team_name(prefix: &str, team_id: &str) -> String {
    format!("{}{}", prefix, team_id.replace('_', "-"))
}

#[derive(Debug, Clone, Default)]
pub struct OrgChart {
    teams: Vec<Team>,
    employees: Vec<Employee>,
    teams_by_id: HashMap<String, usize>,
    employees_by_id: HashMap<String, usize>,
    root_employee: Option<String>,
    remote_prefix: Option<String>
}

impl OrgChart {
    pub fn new(teams: Vec<Team>, employees: Vec<Employee>) -> OrgChartResult<Self> {
        let mut teams_by_id = HashMap::with_capacity(teams.len());
        for (idx, team) in teams.iter().enumerate() {
            if teams_by_id.insert(team.id.clone(), idx).is_some() {
                return Err(OrgChartError::DuplicateTeam(team.id.clone()));
            }
        }

        let mut employees_by_id = HashMap::with_capacity(employees.len());
        for (idx, employee) in employees.iter().enumerate() {
            if employees_by_id.insert(employee.id.clone(), idx).is_some() {
                return Err(OrgChartError::DuplicateEmployee(employee.id.clone()));
            }

            if !teams_by_id.contains_key(&employee.member_of) {
                return Err(OrgChartError::UnknownTeamForEmployee {
                    team_id: employee.member_of.clone(),
                    employee: employee.name.clone()
                });
            }
        }

        debug!(
            teams = teams.len(),
            employees = employees.len(),
            "Indexed org chart"
        );

        Ok(Self {
            teams,
            employees,
            teams_by_id,
            employees_by_id,
            root_employee: None,
            remote_prefix: None
        })
    }

    pub fn from_document(document: ChartDocument) -> OrgChartResult<Self> {
        let chart = Self::new(document.teams, document.employees)?;
        Ok(match document.root_employee {
            Some(root) if !root.is_empty() => chart.with_root_employee(root),
            _ => chart
        })
    }

    /// Employee at the top of every reporting line and the lead of last
    /// resort for teams without one.
    pub fn with_root_employee(mut self, employee_id: impl Into<String>) -> Self {
        self.root_employee = Some(employee_id.into());
        self
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams_by_id.get(id).map(|&idx| &self.teams[idx])
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees_by_id.get(id).map(|&idx| &self.employees[idx])
    }

    pub fn root_employee(&self) -> Option<&str> {
        self.root_employee.as_deref()
    }

    pub fn members_of<'a>(&'a self, team_id: &'a str) -> impl Iterator<Item = &'a Employee> + 'a {
        self.employees.iter().filter(move |e| e.member_of == team_id)
    }

    /// Prefix the remote names were derived with, if they have been.
    pub fn remote_prefix(&self) -> Option<&str> {
        self.remote_prefix.as_deref()
    }

    /// Derives every team's remote name and remote parent name. Fails,
    /// leaving the chart untouched, when two team ids map to the same name.
    pub fn assign_remote_names(&mut self, prefix: &str) -> OrgChartResult<()> {
        let mut owners: HashMap<String, &str> = HashMap::with_capacity(self.teams.len());
        for team in &self.teams {
            let name = remote_team_name(prefix, &team.id);
            if let Some(first) = owners.insert(name.clone(), &team.id) {
                return Err(OrgChartError::RemoteNameCollision {
                    name,
                    first: first.to_string(),
                    second: team.id.clone()
                });
            }
        }

        for team in &mut self.teams {
            team.remote_name = remote_team_name(prefix, &team.id);
            team.remote_parent_name = team
                .parent_id
                .as_deref()
                .map(|parent| remote_team_name(prefix, parent));
        }
        self.remote_prefix = Some(prefix.to_string());
        Ok(())
    }

    pub fn tech_lead(&self, team: &Team) -> OrgChartResult<Option<&Employee>> {
        self.inherited_lead(team, LeadKind::Tech, None)
    }

    pub fn product_lead(&self, team: &Team) -> OrgChartResult<Option<&Employee>> {
        self.inherited_lead(team, LeadKind::Product, None)
    }

    /// Lead of `kind` for `team`, climbing towards the root until a team
    /// names one. Falls back to the root employee. Leads equal to `exclude`
    /// are skipped.
    fn inherited_lead(
        &self,
        team: &Team,
        kind: LeadKind,
        exclude: Option<&str>
    ) -> OrgChartResult<Option<&Employee>> {
        let mut visited: Vec<&str> = Vec::new();
        let mut current = Some(team);

        while let Some(team) = current {
            if visited.contains(&team.id.as_str()) {
                visited.push(&team.id);
                return Err(OrgChartError::CyclicHierarchy {
                    chain: visited.join(" -> ")
                });
            }
            visited.push(&team.id);

            if let Some(lead_id) = team.lead_id(kind).filter(|id| Some(*id) != exclude) {
                return self
                    .employee(lead_id)
                    .map(Some)
                    .ok_or_else(|| OrgChartError::EmployeeNotFound(lead_id.to_string()));
            }

            current = self.parent_of(team)?;
        }

        Ok(self
            .root_employee
            .as_deref()
            .filter(|id| Some(*id) != exclude)
            .and_then(|id| self.employee(id)))
    }

    fn parent_of(&self, team: &Team) -> OrgChartResult<Option<&Team>> {
        match team.parent_id.as_deref() {
            Some(parent_id) => self
                .team(parent_id)
                .map(Some)
                .ok_or_else(|| OrgChartError::TeamNotFound(parent_id.to_string())),
            None => Ok(None)
        }
    }

    /// Who `employee` reports to directly.
    fn direct_lead(&self, employee: &Employee) -> OrgChartResult<Option<&Employee>> {
        if let Some(lead_id) = employee.reports_to.as_deref() {
            return self
                .employee(lead_id)
                .map(Some)
                .ok_or_else(|| OrgChartError::EmployeeNotFound(lead_id.to_string()));
        }

        let kind = if employee.stream.as_ref().is_some_and(Stream::is_technical) {
            LeadKind::Tech
        } else {
            LeadKind::Product
        };

        let team = self
            .team(&employee.member_of)
            .ok_or_else(|| OrgChartError::TeamNotFound(employee.member_of.clone()))?;

        // A team's own lead reports up the parent team's line.
        let start = if team.lead_id(kind) == Some(employee.id.as_str()) {
            self.parent_of(team)?
        } else {
            Some(team)
        };

        match start {
            Some(team) => self.inherited_lead(team, kind, Some(employee.id.as_str())),
            None => Ok(self
                .root_employee
                .as_deref()
                .filter(|id| *id != employee.id)
                .and_then(|id| self.employee(id)))
        }
    }

    /// `::`-joined lead ids from the top of the organisation down to the
    /// employee's direct lead. Empty for the root employee.
    pub fn reporting_line(&self, employee: &Employee) -> OrgChartResult<String> {
        let mut line: Vec<&str> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = employee;

        loop {
            if self.root_employee.as_deref() == Some(current.id.as_str()) {
                break;
            }

            if !visited.insert(&current.id) {
                line.push(&current.id);
                line.reverse();
                return Err(OrgChartError::CyclicReportingLine {
                    chain: line.join(" -> ")
                });
            }

            match self.direct_lead(current)? {
                Some(lead) => {
                    line.push(&lead.id);
                    current = lead;
                }
                None => break
            }
        }

        line.reverse();
        Ok(line.join("::"))
    }

    /// `::`-joined team ids from the root team down to `team`.
    pub fn team_ancestry(&self, team: &Team, include_self: bool) -> OrgChartResult<String> {
        let mut path: Vec<&str> = Vec::new();
        let mut current = Some(team);

        while let Some(team) = current {
            if path.contains(&team.id.as_str()) {
                path.push(&team.id);
                return Err(OrgChartError::CyclicHierarchy {
                    chain: path.join(" -> ")
                });
            }
            path.push(&team.id);
            current = self.parent_of(team)?;
        }

        path.reverse();
        if !include_self {
            path.pop();
        }
        Ok(path.join("::"))
    }

    /// Open vacancies of `team`; all streams when `stream` is `None`.
    pub fn vacancies(&self, team: &Team, stream: Option<&str>) -> u32 {
        count_for_stream(&team.vacancies, stream)
    }

    pub fn backfills(&self, team: &Team, stream: Option<&str>) -> u32 {
        count_for_stream(&team.backfills, stream)
    }
}

fn count_for_stream(counts: &BTreeMap<String, u32>, stream: Option<&str>) -> u32 {
    counts
        .iter()
        .filter(|(s, _)| stream.is_none_or(|wanted| s.eq_ignore_ascii_case(wanted)))
        .map(|(_, count)| *count)
        .sum()
}
