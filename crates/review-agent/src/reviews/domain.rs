use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Employee number as issued by the staff directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for an office, division, or department in the organogram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grade code carried on an employee record.
///
/// Lower numbers rank higher. The code `41` marks the Permanent Member tier, which sits above
/// every numeric grade and follows its own hierarchy rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grade(pub String);

impl Grade {
    pub const PERMANENT_MEMBER: &'static str = "41";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn code(&self) -> &str {
        self.0.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.code().is_empty()
    }

    pub fn is_permanent_member(&self) -> bool {
        self.code() == Self::PERMANENT_MEMBER
    }

    /// Numeric rank, or `None` when the code does not parse.
    pub fn rank(&self) -> Option<u32> {
        self.code().parse().ok()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Read-only employee snapshot served by the staff directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_number: EmployeeId,
    pub full_name: String,
    pub grade: Grade,
    #[serde(default)]
    pub position: Option<String>,
    pub job_title: String,
    pub office_id: UnitId,
    #[serde(default)]
    pub office_name: Option<String>,
    #[serde(default)]
    pub division_id: Option<UnitId>,
    #[serde(default)]
    pub department_id: Option<UnitId>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<EmployeeId>,
    #[serde(default)]
    pub head_of_office: Option<EmployeeId>,
    #[serde(default)]
    pub head_of_division: Option<EmployeeId>,
    #[serde(default)]
    pub head_of_department: Option<EmployeeId>,
}

impl EmployeeRecord {
    pub const GOVERNOR_MARKER: &'static str = "GOVERNOR";

    /// Governors and deputy governors are recognised by their job title.
    pub fn is_governor(&self) -> bool {
        self.job_title
            .to_uppercase()
            .contains(Self::GOVERNOR_MARKER)
    }

    pub fn heads_own_department(&self) -> bool {
        self.head_of_department.as_ref() == Some(&self.employee_number)
    }

    /// Upper-cased first letters of each name part, e.g. `"Ada K. Obi"` becomes `"AKO"`.
    pub fn initials(&self) -> String {
        self.full_name
            .split_whitespace()
            .filter_map(|part| part.chars().find(|c| c.is_alphanumeric()))
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Position text before its first `.`, or the raw job title when no position is recorded.
    pub fn cleaned_position(&self) -> String {
        let truncated = self
            .position
            .as_deref()
            .and_then(|position| position.split('.').next())
            .map(str::trim)
            .unwrap_or_default();

        if truncated.is_empty() {
            self.job_title.trim().to_string()
        } else {
            truncated.to_string()
        }
    }

    /// Dot-delimited `position.office.job title` descriptor used for fuzzy role matching.
    pub fn role_descriptor(&self) -> String {
        format!(
            "{}.{}.{}",
            self.position.as_deref().unwrap_or_default().trim(),
            self.office_name.as_deref().unwrap_or_default().trim(),
            self.job_title.trim()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewPeriodId(pub u32);

impl fmt::Display for ReviewPeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Evaluation window. Only an active, approved, undeleted period is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPeriod {
    pub id: ReviewPeriodId,
    pub name: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    pub active: bool,
    pub approved: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl ReviewPeriod {
    pub fn is_current(&self) -> bool {
        self.active && self.approved && !self.deleted
    }
}

/// The relationship under which a rating is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    #[serde(rename = "self")]
    SelfReview,
    Supervisor,
    Peers,
    Subordinates,
    Superior,
}

impl ReviewKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::SelfReview,
            Self::Supervisor,
            Self::Peers,
            Self::Subordinates,
            Self::Superior,
        ]
    }

    /// Name under which the review type is registered in the catalogue.
    pub const fn catalogue_name(self) -> &'static str {
        match self {
            Self::SelfReview => "Self",
            Self::Supervisor => "Supervisor",
            Self::Peers => "Peers",
            Self::Subordinates => "Subordinates",
            Self::Superior => "Superior",
        }
    }

    /// Self and supervisor reviews carry a technical leg; the counterpart reviews do not.
    pub const fn includes_technical(self) -> bool {
        matches!(self, Self::SelfReview | Self::Supervisor)
    }
}

impl fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalogue_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewTypeId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewType {
    pub id: ReviewTypeId,
    pub name: String,
}

impl ReviewType {
    pub fn matches(&self, kind: ReviewKind) -> bool {
        self.name.trim().eq_ignore_ascii_case(kind.catalogue_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RatingId(pub u32);

impl RatingId {
    /// Lowest catalogue rating, used when an average has no exact rating value.
    pub const FALLBACK: RatingId = RatingId(1);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GradeGroupId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeGroup {
    pub id: GradeGroupId,
    pub name: String,
    pub grades: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobRoleId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRole {
    pub id: JobRoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompetencyId(pub u32);

impl fmt::Display for CompetencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competency {
    pub id: CompetencyId,
    pub name: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub technical: bool,
}

/// Behavioral competency expected of a grade group, with its target rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehavioralMapping {
    pub grade_group_id: GradeGroupId,
    pub competency_id: CompetencyId,
    pub expected_rating_id: RatingId,
}

/// Technical competency expected of a job role within an office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalMapping {
    pub office_id: UnitId,
    pub job_role_id: JobRoleId,
    /// Dot-delimited description of the job role the mapping was registered for.
    pub job_role_description: String,
    pub competency_id: CompetencyId,
    pub expected_rating_id: RatingId,
}

/// Weight a review type contributes to a competency category's technical score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyCategoryGrading {
    pub category_id: CategoryId,
    pub review_type_id: ReviewTypeId,
    pub weight_percentage: f64,
}

/// A single reviewer's evaluation of one competency for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyReview {
    pub competency_id: CompetencyId,
    pub employee_number: EmployeeId,
    pub employee_name: String,
    pub employee_initial: String,
    pub employee_grade: Grade,
    #[serde(default)]
    pub employee_department: Option<String>,
    pub expected_rating_id: RatingId,
    pub reviewer_id: EmployeeId,
    pub reviewer_name: String,
    pub review_period_id: ReviewPeriodId,
    pub review_type_id: ReviewTypeId,
    pub technical: bool,
    /// Zero until the reviewer submits a rating.
    #[serde(default)]
    pub actual_rating_value: u32,
    #[serde(default)]
    pub deleted: bool,
}

impl CompetencyReview {
    pub fn is_rated(&self) -> bool {
        self.actual_rating_value > 0
    }

    pub fn is_self_review(&self) -> bool {
        self.reviewer_id == self.employee_number
    }
}

/// Aggregated outcome for one subject, period, and competency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyReviewProfile {
    pub employee_number: EmployeeId,
    pub employee_name: String,
    pub employee_grade: Grade,
    pub office_id: UnitId,
    #[serde(default)]
    pub office_name: Option<String>,
    #[serde(default)]
    pub division_id: Option<UnitId>,
    #[serde(default)]
    pub department_id: Option<UnitId>,
    #[serde(default)]
    pub department_name: Option<String>,
    pub review_period_id: ReviewPeriodId,
    pub competency_id: CompetencyId,
    pub competency_name: String,
    pub technical: bool,
    pub expected_rating_id: RatingId,
    pub expected_rating_name: String,
    pub expected_rating_value: u32,
    pub average_rating_id: RatingId,
    pub average_rating_name: String,
    pub average_rating_value: u32,
    pub average_score: f64,
    pub competency_gap: f64,
    pub has_gap: bool,
}
