use std::collections::HashSet;
use std::sync::Arc;

use crate::reviews::domain::{
    BehavioralMapping, CategoryId, Competency, CompetencyId, CompetencyReview, EmployeeId,
    EmployeeRecord, Grade, GradeGroup, GradeGroupId, JobRole, JobRoleId, Rating, RatingId,
    ReviewPeriod, ReviewPeriodId, ReviewType, ReviewTypeId, TechnicalMapping, UnitId,
};
use crate::reviews::hierarchy::CandidatePicker;
use crate::reviews::memory::{InMemoryOrganisation, InMemoryReviewStore};
use crate::reviews::repository::{
    PopulationSegment, RepositoryError, ReviewRepository, SegmentInsert,
};
use crate::reviews::seed::OrganisationSnapshot;

pub(super) const PERIOD: ReviewPeriodId = ReviewPeriodId(7);
pub(super) const SELF_TYPE: ReviewTypeId = ReviewTypeId(1);
pub(super) const SUPERVISOR_TYPE: ReviewTypeId = ReviewTypeId(2);
pub(super) const PEERS_TYPE: ReviewTypeId = ReviewTypeId(3);
pub(super) const SUBORDINATES_TYPE: ReviewTypeId = ReviewTypeId(4);
pub(super) const SUPERIOR_TYPE: ReviewTypeId = ReviewTypeId(5);

pub(super) const INTEGRITY: CompetencyId = CompetencyId(10);
pub(super) const TEAMWORK: CompetencyId = CompetencyId(11);
pub(super) const FINANCIAL_REPORTING: CompetencyId = CompetencyId(20);
pub(super) const CASH_HANDLING: CompetencyId = CompetencyId(21);
pub(super) const RECONCILIATION: CompetencyId = CompetencyId(22);

pub(super) const BEHAVIORAL_CATEGORY: CategoryId = CategoryId(1);
pub(super) const TECHNICAL_CATEGORY: CategoryId = CategoryId(2);

pub(super) const TREASURY_OFFICE: &str = "OFF-TRS";

/// Always chooses the first candidate.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct FirstPicker;

impl CandidatePicker for FirstPicker {
    fn pick(&self, len: usize) -> Option<usize> {
        (len > 0).then_some(0)
    }
}

/// Always chooses the last candidate.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct LastPicker;

impl CandidatePicker for LastPicker {
    fn pick(&self, len: usize) -> Option<usize> {
        len.checked_sub(1)
    }
}

pub(super) fn id(value: &str) -> EmployeeId {
    EmployeeId::new(value)
}

pub(super) fn unit(value: &str) -> UnitId {
    UnitId::new(value)
}

/// Employee in the treasury division and finance department unless overridden.
pub(super) fn employee(number: &str, grade: &str, office: &str) -> EmployeeRecord {
    EmployeeRecord {
        employee_number: id(number),
        full_name: format!("Staff {number}"),
        grade: Grade::new(grade),
        position: None,
        job_title: "Officer".to_string(),
        office_id: unit(office),
        office_name: Some("Treasury Operations".to_string()),
        division_id: Some(unit("DIV-TRS")),
        department_id: Some(unit("DEP-FIN")),
        department_name: Some("Finance".to_string()),
        supervisor_id: None,
        head_of_office: None,
        head_of_division: None,
        head_of_department: None,
    }
}

pub(super) fn current_period() -> ReviewPeriod {
    ReviewPeriod {
        id: PERIOD,
        name: "2026 Cycle".to_string(),
        start: None,
        end: None,
        active: true,
        approved: true,
        deleted: false,
    }
}

pub(super) fn ratings() -> Vec<Rating> {
    [
        (1, "Undefined"),
        (2, "Basic"),
        (3, "Intermediate"),
        (4, "Advanced"),
        (5, "Expert"),
    ]
    .into_iter()
    .map(|(value, name)| Rating {
        id: RatingId(value),
        name: name.to_string(),
        value,
    })
    .collect()
}

pub(super) fn review_types() -> Vec<ReviewType> {
    [
        (SELF_TYPE, "Self"),
        (SUPERVISOR_TYPE, "Supervisor"),
        (PEERS_TYPE, "Peers"),
        (SUBORDINATES_TYPE, "Subordinates"),
        (SUPERIOR_TYPE, "Superior"),
    ]
    .into_iter()
    .map(|(id, name)| ReviewType {
        id,
        name: name.to_string(),
    })
    .collect()
}

pub(super) fn technical_mapping(
    job_role: u32,
    description: &str,
    competency: CompetencyId,
    expected: u32,
) -> TechnicalMapping {
    TechnicalMapping {
        office_id: unit(TREASURY_OFFICE),
        job_role_id: JobRoleId(job_role),
        job_role_description: description.to_string(),
        competency_id: competency,
        expected_rating_id: RatingId(expected),
    }
}

/// Catalogue with two behavioral and three technical competencies for the treasury office.
pub(super) fn catalogue() -> OrganisationSnapshot {
    let grade_groups = vec![
        GradeGroup {
            id: GradeGroupId(1),
            name: "Executive".to_string(),
            grades: vec!["41".to_string(), "01".to_string(), "02".to_string(), "03".to_string()],
        },
        GradeGroup {
            id: GradeGroupId(2),
            name: "Management".to_string(),
            grades: ["04", "05", "06", "07"].iter().map(|g| g.to_string()).collect(),
        },
        GradeGroup {
            id: GradeGroupId(3),
            name: "Officer".to_string(),
            grades: ["08", "09", "10", "11", "12"].iter().map(|g| g.to_string()).collect(),
        },
    ];

    let behavioral_mappings = grade_groups
        .iter()
        .flat_map(|group| {
            [
                BehavioralMapping {
                    grade_group_id: group.id,
                    competency_id: INTEGRITY,
                    expected_rating_id: RatingId(4),
                },
                BehavioralMapping {
                    grade_group_id: group.id,
                    competency_id: TEAMWORK,
                    expected_rating_id: RatingId(3),
                },
            ]
        })
        .collect();

    OrganisationSnapshot {
        employees: Vec::new(),
        periods: vec![current_period()],
        review_types: review_types(),
        ratings: ratings(),
        grade_groups,
        job_roles: vec![
            JobRole {
                id: JobRoleId(1),
                name: "Senior Accountant".to_string(),
                description: "Finance.Treasury Operations.Senior Accountant".to_string(),
            },
            JobRole {
                id: JobRoleId(2),
                name: "Cashier".to_string(),
                description: "Finance.Treasury Operations.Cashier".to_string(),
            },
        ],
        competencies: vec![
            competency(INTEGRITY, "Integrity", BEHAVIORAL_CATEGORY, false),
            competency(TEAMWORK, "Teamwork", BEHAVIORAL_CATEGORY, false),
            competency(FINANCIAL_REPORTING, "Financial Reporting", TECHNICAL_CATEGORY, true),
            competency(CASH_HANDLING, "Cash Handling", TECHNICAL_CATEGORY, true),
            competency(RECONCILIATION, "Reconciliation", TECHNICAL_CATEGORY, true),
        ],
        behavioral_mappings,
        technical_mappings: vec![
            technical_mapping(
                1,
                "Finance.Treasury Operations.Senior Accountant",
                FINANCIAL_REPORTING,
                4,
            ),
            technical_mapping(2, "Finance.Treasury Operations.Cashier", CASH_HANDLING, 3),
            technical_mapping(
                3,
                "Finance.Treasury Operations.Reconciliation Analyst",
                RECONCILIATION,
                3,
            ),
            technical_mapping(
                4,
                "Audit.Treasury Operations.Reconciliation Analyst",
                RECONCILIATION,
                3,
            ),
        ],
        gradings: Vec::new(),
    }
}

fn competency(id: CompetencyId, name: &str, category: CategoryId, technical: bool) -> Competency {
    Competency {
        id,
        name: name.to_string(),
        category_id: category,
        technical,
    }
}

pub(super) fn organisation(employees: Vec<EmployeeRecord>) -> Arc<InMemoryOrganisation> {
    let mut snapshot = catalogue();
    snapshot.employees = employees;
    Arc::new(InMemoryOrganisation::new(snapshot))
}

pub(super) fn ids(records: &[EmployeeRecord]) -> HashSet<String> {
    records
        .iter()
        .map(|record| record.employee_number.0.clone())
        .collect()
}

pub(super) fn expected_ids(values: &[&str]) -> HashSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Small treasury office: a manager, two analysts reporting to them, and a clerk.
pub(super) fn treasury_team() -> Vec<EmployeeRecord> {
    let head = EmployeeRecord {
        job_title: "Head, Treasury".to_string(),
        ..employee("H001", "04", TREASURY_OFFICE)
    };

    let manager = EmployeeRecord {
        position: Some("Senior Accountant.Treasury".to_string()),
        job_title: "Senior Accountant".to_string(),
        supervisor_id: Some(id("H001")),
        head_of_office: Some(id("H001")),
        ..employee("M001", "06", TREASURY_OFFICE)
    };

    let analyst = |number: &str| EmployeeRecord {
        position: Some("Cashier".to_string()),
        job_title: "Cashier".to_string(),
        supervisor_id: Some(id("M001")),
        head_of_office: Some(id("H001")),
        ..employee(number, "09", TREASURY_OFFICE)
    };

    let clerk = EmployeeRecord {
        supervisor_id: Some(id("M001")),
        head_of_office: Some(id("H001")),
        ..employee("C001", "11", TREASURY_OFFICE)
    };

    vec![head, manager, analyst("A001"), analyst("A002"), clerk]
}

pub(super) fn reviews_of<'a>(
    reviews: &'a [CompetencyReview],
    employee: &str,
    review_type: ReviewTypeId,
) -> Vec<&'a CompetencyReview> {
    reviews
        .iter()
        .filter(|review| review.employee_number.0 == employee && review.review_type_id == review_type)
        .collect()
}

/// Review store that refuses inserts for chosen subjects or review types.
#[derive(Debug, Default, Clone)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryReviewStore,
    pub(super) failing_employees: HashSet<String>,
    pub(super) failing_types: HashSet<ReviewTypeId>,
}

impl FlakyStore {
    fn refuses(&self, review: &CompetencyReview) -> bool {
        self.failing_employees.contains(&review.employee_number.0)
            || self.failing_types.contains(&review.review_type_id)
    }
}

impl ReviewRepository for FlakyStore {
    fn insert_segments(
        &self,
        segments: Vec<PopulationSegment>,
    ) -> Result<SegmentInsert, RepositoryError> {
        let refused = segments
            .iter()
            .flat_map(|segment| segment.reviews.iter())
            .any(|review| self.refuses(review));
        if refused {
            return Err(RepositoryError::Unavailable("insert refused".to_string()));
        }
        self.inner.insert_segments(segments)
    }

    fn insert_reviews(&self, reviews: Vec<CompetencyReview>) -> Result<usize, RepositoryError> {
        if reviews.iter().any(|review| self.refuses(review)) {
            return Err(RepositoryError::Unavailable("insert refused".to_string()));
        }
        self.inner.insert_reviews(reviews)
    }

    fn reviews_for(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
        technical: bool,
    ) -> Result<Vec<CompetencyReview>, RepositoryError> {
        self.inner.reviews_for(employee, period, technical)
    }
}
