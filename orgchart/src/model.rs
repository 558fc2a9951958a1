use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::EnumString;

/// Generates the string conversions shared by the chart's open enums: known
/// values parse case-insensitively, anything else is kept verbatim in
/// `Other` and written back unchanged.
macro_rules! open_enum_strings {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Other(raw) => raw
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                raw.parse().unwrap_or(Self::Other(raw))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_string()
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Stream {
    Engineering,
    Operations,
    Product,
    Portfolio,
    Data,
    Design,
    #[strum(default)]
    Other(String)
}

open_enum_strings!(Stream {
    Engineering => "ENGINEERING",
    Operations => "OPERATIONS",
    Product => "PRODUCT",
    Portfolio => "PORTFOLIO",
    Data => "DATA",
    Design => "DESIGN"
});

impl Stream {
    /// Streams whose reporting line follows tech leads rather than product
    /// leads.
    pub fn is_technical(&self) -> bool {
        matches!(self, Self::Engineering | Self::Operations)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum EmployeeType {
    #[default]
    Employee,
    Temp,
    Contractor,
    AgencyContractor,
    #[strum(default)]
    Other(String)
}

open_enum_strings!(EmployeeType {
    Employee => "EMPLOYEE",
    Temp => "TEMP",
    Contractor => "CONTRACTOR",
    AgencyContractor => "AGENCY_CONTRACTOR"
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TeamKind {
    Department,
    Tribe,
    Squad,
    Team,
    Unit,
    #[strum(default)]
    Other(String)
}

open_enum_strings!(TeamKind {
    Department => "DEPARTMENT",
    Tribe => "TRIBE",
    Squad => "SQUAD",
    Team => "TEAM",
    Unit => "UNIT"
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub kind: Option<TeamKind>,
    #[serde(default, rename = "parent", deserialize_with = "empty_as_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "techLead", deserialize_with = "empty_as_none")]
    pub tech_lead_id: Option<String>,
    #[serde(default, rename = "productLead", deserialize_with = "empty_as_none")]
    pub product_lead_id: Option<String>,
    #[serde(default)]
    pub vacancies: BTreeMap<String, u32>,
    #[serde(default)]
    pub backfills: BTreeMap<String, u32>,

    /// Name of the team on the collaboration platform. Derived once by
    /// [`crate::OrgChart::assign_remote_names`].
    #[serde(skip)]
    pub remote_name: String,
    #[serde(skip)]
    pub remote_parent_name: Option<String>
}

impl Team {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: None,
            parent_id: None,
            description: String::new(),
            tech_lead_id: None,
            product_lead_id: None,
            vacancies: BTreeMap::new(),
            backfills: BTreeMap::new(),
            remote_name: String::new(),
            remote_parent_name: None
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tech_lead(mut self, employee_id: impl Into<String>) -> Self {
        self.tech_lead_id = Some(employee_id.into());
        self
    }

    pub fn with_product_lead(mut self, employee_id: impl Into<String>) -> Self {
        self.product_lead_id = Some(employee_id.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Login on the collaboration platform.
    #[serde(default, rename = "github", deserialize_with = "empty_as_none")]
    pub handle: Option<String>,
    #[serde(default)]
    pub member_of: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub reports_to: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub stream: Option<Stream>,
    #[serde(default, rename = "type", deserialize_with = "blank_as_default")]
    pub employee_type: EmployeeType,
    #[serde(default)]
    pub number: Option<serde_json::Value>,
    #[serde(default)]
    pub start_date: Option<String>
}

impl Employee {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        member_of: impl Into<String>
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: None,
            handle: None,
            member_of: member_of.into(),
            reports_to: None,
            stream: None,
            employee_type: EmployeeType::Employee,
            number: None,
            start_date: None
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_stream(mut self, stream: Stream) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_reports_to(mut self, employee_id: impl Into<String>) -> Self {
        self.reports_to = Some(employee_id.into());
        self
    }

    /// The platform handle, if one is set and non-blank.
    pub fn remote_handle(&self) -> Option<&str> {
        self.handle.as_deref().filter(|h| !h.trim().is_empty())
    }
}

/// The stored document the chart is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDocument {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub root_employee: Option<String>
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: From<String>
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()).map(T::from))
}

fn blank_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: From<String> + Default
{
    Ok(blank_as_none(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_deserializes_camel_case_document() {
        let json = r#"{
            "id": "platform_eng",
            "name": "Platform",
            "kind": "TRIBE",
            "parent": "tech",
            "techLead": "ann",
            "productLead": "",
            "vacancies": {"ENGINEERING": 2}
        }"#;

        let team: Team = serde_json::from_str(json).unwrap();
        assert_eq!(team.parent_id.as_deref(), Some("tech"));
        assert_eq!(team.tech_lead_id.as_deref(), Some("ann"));
        assert!(team.product_lead_id.is_none());
        assert_eq!(team.kind, Some(TeamKind::Tribe));
        assert_eq!(team.vacancies.get("ENGINEERING"), Some(&2));
        assert!(team.remote_name.is_empty());
    }

    #[test]
    fn test_employee_blank_handle_is_not_a_handle() {
        let employee = Employee::new("bob", "Bob", "tech").with_handle("  ");
        assert!(employee.remote_handle().is_none());

        let json = r#"{"id": "amy", "name": "Amy", "github": "", "memberOf": "tech", "stream": "DATA"}"#;
        let employee: Employee = serde_json::from_str(json).unwrap();
        assert!(employee.handle.is_none());
        assert_eq!(employee.stream, Some(Stream::Data));
        assert_eq!(employee.employee_type, EmployeeType::Employee);
    }

    #[test]
    fn test_unknown_stream_keeps_raw_value() {
        let stream: Stream = serde_json::from_str("\"MARKETING\"").unwrap();
        assert_eq!(stream, Stream::Other("MARKETING".to_string()));
        assert_eq!(stream.to_string(), "MARKETING");
        assert_eq!(serde_json::to_string(&stream).unwrap(), "\"MARKETING\"");
        assert!(!stream.is_technical());
        assert!(Stream::Operations.is_technical());
    }

    #[test]
    fn test_unknown_team_kind_loads() {
        let team: Team = serde_json::from_str(r#"{"id": "g", "name": "Guild", "kind": "GUILD"}"#).unwrap();
        assert_eq!(team.kind, Some(TeamKind::Other("GUILD".to_string())));

        let team: Team = serde_json::from_str(r#"{"id": "g", "name": "Guild", "kind": ""}"#).unwrap();
        assert!(team.kind.is_none());

        let team: Team = serde_json::from_str(r#"{"id": "g", "name": "Guild", "kind": "squad"}"#).unwrap();
        assert_eq!(team.kind, Some(TeamKind::Squad));
    }

    #[test]
    fn test_employee_type_accepts_any_value() {
        let employee: Employee =
            serde_json::from_str(r#"{"id": "a", "name": "A", "memberOf": "t", "type": ""}"#).unwrap();
        assert_eq!(employee.employee_type, EmployeeType::Employee);

        let employee: Employee =
            serde_json::from_str(r#"{"id": "a", "name": "A", "memberOf": "t", "type": null}"#).unwrap();
        assert_eq!(employee.employee_type, EmployeeType::Employee);

        let employee: Employee =
            serde_json::from_str(r#"{"id": "a", "name": "A", "memberOf": "t", "type": "INTERN"}"#).unwrap();
        assert_eq!(employee.employee_type, EmployeeType::Other("INTERN".to_string()));
        assert_eq!(employee.employee_type.to_string(), "INTERN");

        let employee: Employee = serde_json::from_str(
            r#"{"id": "a", "name": "A", "memberOf": "t", "type": "AGENCY_CONTRACTOR", "stream": ""}"#
        )
        .unwrap();
        assert_eq!(employee.employee_type, EmployeeType::AgencyContractor);
        assert!(employee.stream.is_none());
    }

    #[test]
    fn test_stream_parses_case_insensitively() {
        let stream: Stream = "engineering".parse().unwrap();
        assert_eq!(stream, Stream::Engineering);
        assert_eq!(Stream::Portfolio.to_string(), "PORTFOLIO");
    }
}
