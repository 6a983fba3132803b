//! Loading organisation snapshots from directory exports and catalogue documents.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{
    BehavioralMapping, Competency, CompetencyCategoryGrading, EmployeeId, EmployeeRecord, Grade,
    GradeGroup, JobRole, Rating, ReviewPeriod, ReviewType, TechnicalMapping, UnitId,
};

/// Directory and catalogue data backing the in-memory collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganisationSnapshot {
    #[serde(default)]
    pub employees: Vec<EmployeeRecord>,
    #[serde(default)]
    pub periods: Vec<ReviewPeriod>,
    #[serde(default)]
    pub review_types: Vec<ReviewType>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub grade_groups: Vec<GradeGroup>,
    #[serde(default)]
    pub job_roles: Vec<JobRole>,
    #[serde(default)]
    pub competencies: Vec<Competency>,
    #[serde(default)]
    pub behavioral_mappings: Vec<BehavioralMapping>,
    #[serde(default)]
    pub technical_mappings: Vec<TechnicalMapping>,
    #[serde(default)]
    pub gradings: Vec<CompetencyCategoryGrading>,
}

impl OrganisationSnapshot {
    /// Parse a catalogue document; an `employees` array is optional.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, SeedError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load the catalogue document and, when given, replace its employees with a directory export.
    pub fn load(catalogue: &Path, directory: Option<&Path>) -> Result<Self, SeedError> {
        let mut snapshot = Self::from_json_reader(File::open(catalogue)?)?;
        if let Some(path) = directory {
            snapshot.employees = parse_directory(File::open(path)?)?;
        }
        Ok(snapshot)
    }
}

/// Parse an employee directory CSV export.
pub fn parse_directory<R: Read>(reader: R) -> Result<Vec<EmployeeRecord>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut employees = Vec::new();

    for row in csv_reader.deserialize::<DirectoryRow>() {
        employees.push(row?.into_record());
    }

    Ok(employees)
}

#[derive(Debug, Deserialize)]
struct DirectoryRow {
    #[serde(rename = "Employee Number")]
    employee_number: String,
    #[serde(rename = "Full Name")]
    full_name: String,
    #[serde(rename = "Grade", default)]
    grade: String,
    #[serde(rename = "Position", default, deserialize_with = "empty_string_as_none")]
    position: Option<String>,
    #[serde(rename = "Job Title", default)]
    job_title: String,
    #[serde(rename = "Office Id")]
    office_id: String,
    #[serde(rename = "Office Name", default, deserialize_with = "empty_string_as_none")]
    office_name: Option<String>,
    #[serde(rename = "Division Id", default, deserialize_with = "empty_string_as_none")]
    division_id: Option<String>,
    #[serde(rename = "Department Id", default, deserialize_with = "empty_string_as_none")]
    department_id: Option<String>,
    #[serde(
        rename = "Department Name",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    department_name: Option<String>,
    #[serde(rename = "Supervisor Id", default, deserialize_with = "empty_string_as_none")]
    supervisor_id: Option<String>,
    #[serde(rename = "Head Of Office", default, deserialize_with = "empty_string_as_none")]
    head_of_office: Option<String>,
    #[serde(
        rename = "Head Of Division",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    head_of_division: Option<String>,
    #[serde(
        rename = "Head Of Department",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    head_of_department: Option<String>,
}

impl DirectoryRow {
    fn into_record(self) -> EmployeeRecord {
        EmployeeRecord {
            employee_number: EmployeeId(self.employee_number),
            full_name: self.full_name,
            grade: Grade(self.grade),
            position: self.position,
            job_title: self.job_title,
            office_id: UnitId(self.office_id),
            office_name: self.office_name,
            division_id: self.division_id.map(UnitId),
            department_id: self.department_id.map(UnitId),
            department_name: self.department_name,
            supervisor_id: self.supervisor_id.map(EmployeeId),
            head_of_office: self.head_of_office.map(EmployeeId),
            head_of_division: self.head_of_division.map(EmployeeId),
            head_of_department: self.head_of_department.map(EmployeeId),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Failure while reading seed files.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid directory export: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid catalogue document: {0}")]
    Json(#[from] serde_json::Error),
}
