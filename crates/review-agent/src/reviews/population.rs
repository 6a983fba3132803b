//! Creation of per-employee evaluation records for each review type in the current period.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    BehavioralMapping, CompetencyId, CompetencyReview, EmployeeId, EmployeeRecord, RatingId,
    ReviewKind, ReviewPeriod, ReviewPeriodId, ReviewType, TechnicalMapping, UnitId,
};
use super::hierarchy::{CandidatePicker, OrgHierarchyResolver, ThreadRngPicker};
use super::matching::is_partial_match;
use super::repository::{
    review_type_for, Organisation, PopulationGuard, PopulationKey, PopulationSegment,
    RepositoryError, ReviewRepository,
};

/// Which employees a population run covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PopulationScope {
    Employee(EmployeeId),
    Office(UnitId),
    Division(UnitId),
    Department(UnitId),
    Organisation,
}

impl PopulationScope {
    pub fn label(&self) -> String {
        match self {
            Self::Employee(id) => format!("employee {id}"),
            Self::Office(id) => format!("office {id}"),
            Self::Division(id) => format!("division {id}"),
            Self::Department(id) => format!("department {id}"),
            Self::Organisation => "organisation".to_string(),
        }
    }
}

/// Shared flag a caller sets to stop a batch between units of work.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a review type produced no records for an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingGrade,
    ReviewTypeNotConfigured,
    NoCounterpart,
    AlreadyPopulated,
    NoCompetencies,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewTypeOutcome {
    pub review_type: ReviewKind,
    pub created: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<EmployeeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeOutcome {
    pub employee: EmployeeId,
    pub created: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    pub review_types: Vec<ReviewTypeOutcome>,
}

/// A unit of work that failed without stopping the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulationFailure {
    pub employee: EmployeeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_type: Option<ReviewKind>,
    pub operation: &'static str,
    pub message: String,
}

/// Summary of a population batch. Completion means every employee was attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<ReviewPeriodId>,
    pub attempted: usize,
    pub created: usize,
    pub cancelled: bool,
    pub employees: Vec<EmployeeOutcome>,
    pub failures: Vec<PopulationFailure>,
}

/// Technical competencies selected for an employee's self and supervisor reviews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TechnicalSelection {
    /// Mapped to the employee's job role within the office.
    Exact(Vec<TechnicalMapping>),
    /// Office mappings whose job-role description fuzzily matches the employee.
    Fuzzy(Vec<TechnicalMapping>),
}

impl TechnicalSelection {
    pub fn mappings(&self) -> &[TechnicalMapping] {
        match self {
            Self::Exact(mappings) | Self::Fuzzy(mappings) => mappings,
        }
    }
}

/// Catalogue data resolved once per employee and shared by every review type.
#[derive(Debug, Clone)]
struct EmployeePlan {
    behavioral: Vec<BehavioralMapping>,
    technical: TechnicalSelection,
}

/// Populates competency reviews for every review type, one employee at a time.
pub struct ReviewPopulationEngine<O, R, K = ThreadRngPicker> {
    organisation: Arc<O>,
    reviews: Arc<R>,
    resolver: OrgHierarchyResolver<O, K>,
}

impl<O, R> ReviewPopulationEngine<O, R, ThreadRngPicker>
where
    O: Organisation + 'static,
    R: ReviewRepository + 'static,
{
    pub fn with_thread_rng(organisation: Arc<O>, reviews: Arc<R>) -> Self {
        Self::new(organisation, reviews, Arc::new(ThreadRngPicker))
    }
}

impl<O, R, K> ReviewPopulationEngine<O, R, K>
where
    O: Organisation + 'static,
    R: ReviewRepository + 'static,
    K: CandidatePicker + 'static,
{
    pub fn new(organisation: Arc<O>, reviews: Arc<R>, picker: Arc<K>) -> Self {
        let resolver = OrgHierarchyResolver::new(Arc::clone(&organisation), picker);
        Self {
            organisation,
            reviews,
            resolver,
        }
    }

    pub fn resolver(&self) -> &OrgHierarchyResolver<O, K> {
        &self.resolver
    }

    pub fn populate(&self, scope: &PopulationScope) -> Result<PopulationReport, PopulationError> {
        self.populate_until_cancelled(scope, &CancellationFlag::new())
    }

    /// Populate every employee in `scope`, stopping between units of work once `cancel` is set.
    pub fn populate_until_cancelled(
        &self,
        scope: &PopulationScope,
        cancel: &CancellationFlag,
    ) -> Result<PopulationReport, PopulationError> {
        let Some(period) = self.organisation.current_period()? else {
            info!(scope = %scope.label(), "no current review period; nothing to populate");
            return Ok(PopulationReport::default());
        };

        let employees = self.employees_in(scope)?;
        let review_types = self.review_types()?;

        let mut report = PopulationReport {
            period: Some(period.id),
            ..PopulationReport::default()
        };

        for employee in &employees {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            report.attempted += 1;
            let result = self.populate_employee(
                &period,
                employee,
                &review_types,
                cancel,
                &mut report.failures,
            );
            match result {
                Ok(outcome) => {
                    report.created += outcome.created;
                    report.employees.push(outcome);
                }
                Err(err) => {
                    warn!(
                        employee = %employee.employee_number,
                        operation = "populate_employee",
                        error = %err,
                        "review population failed for employee"
                    );
                    report.failures.push(PopulationFailure {
                        employee: employee.employee_number.clone(),
                        review_type: None,
                        operation: "populate_employee",
                        message: err.to_string(),
                    });
                }
            }
        }

        report.cancelled |= cancel.is_cancelled();

        info!(
            scope = %scope.label(),
            period = %period.id,
            attempted = report.attempted,
            created = report.created,
            failures = report.failures.len(),
            cancelled = report.cancelled,
            "review population finished"
        );

        Ok(report)
    }

    /// Resolve the technical competencies an employee is reviewed on.
    pub fn technical_selection(
        &self,
        employee: &EmployeeRecord,
    ) -> Result<TechnicalSelection, RepositoryError> {
        let exact = match self.organisation.job_role_like(&employee.cleaned_position())? {
            Some(role) => self
                .organisation
                .technical_mappings(&employee.office_id, role.id)?,
            None => Vec::new(),
        };

        if !exact.is_empty() {
            return Ok(TechnicalSelection::Exact(exact));
        }

        let descriptor = employee.role_descriptor();
        let mut seen = HashSet::new();
        let fuzzy = self
            .organisation
            .office_technical_mappings(&employee.office_id)?
            .into_iter()
            .filter(|mapping| is_partial_match(&mapping.job_role_description, &descriptor))
            .filter(|mapping| seen.insert(mapping.competency_id))
            .collect();

        Ok(TechnicalSelection::Fuzzy(fuzzy))
    }

    fn employees_in(&self, scope: &PopulationScope) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        match scope {
            PopulationScope::Employee(id) => {
                Ok(self.organisation.employee(id)?.into_iter().collect())
            }
            PopulationScope::Office(id) => self.organisation.in_office(id),
            PopulationScope::Division(id) => self.organisation.in_division(id),
            PopulationScope::Department(id) => self.organisation.in_department(id),
            PopulationScope::Organisation => self.organisation.all(),
        }
    }

    fn review_types(&self) -> Result<Vec<(ReviewKind, Option<ReviewType>)>, RepositoryError> {
        ReviewKind::ordered()
            .into_iter()
            .map(|kind| review_type_for(self.organisation.as_ref(), kind).map(|found| (kind, found)))
            .collect()
    }

    fn plan(&self, employee: &EmployeeRecord) -> Result<EmployeePlan, RepositoryError> {
        let behavioral = match self.organisation.grade_group_for(&employee.grade)? {
            Some(group) => self.organisation.behavioral_mappings(group.id)?,
            None => {
                debug!(
                    employee = %employee.employee_number,
                    grade = %employee.grade,
                    "grade has no grade group; no behavioral competencies"
                );
                Vec::new()
            }
        };

        Ok(EmployeePlan {
            behavioral,
            technical: self.technical_selection(employee)?,
        })
    }

    fn populate_employee(
        &self,
        period: &ReviewPeriod,
        employee: &EmployeeRecord,
        review_types: &[(ReviewKind, Option<ReviewType>)],
        cancel: &CancellationFlag,
        failures: &mut Vec<PopulationFailure>,
    ) -> Result<EmployeeOutcome, PopulationError> {
        let mut outcome = EmployeeOutcome {
            employee: employee.employee_number.clone(),
            created: 0,
            skipped: None,
            review_types: Vec::new(),
        };

        if employee.grade.is_blank() {
            debug!(employee = %employee.employee_number, "employee has no grade; skipping");
            outcome.skipped = Some(SkipReason::MissingGrade);
            return Ok(outcome);
        }

        let plan = self.plan(employee)?;

        for (kind, review_type) in review_types {
            if cancel.is_cancelled() {
                break;
            }

            let Some(review_type) = review_type else {
                warn!(review_type = %kind, "review type missing from catalogue");
                outcome.review_types.push(ReviewTypeOutcome {
                    review_type: *kind,
                    created: 0,
                    reviewer: None,
                    skipped: Some(SkipReason::ReviewTypeNotConfigured),
                });
                continue;
            };

            match self.populate_review_type(period, employee, *kind, review_type, &plan) {
                Ok(type_outcome) => {
                    outcome.created += type_outcome.created;
                    outcome.review_types.push(type_outcome);
                }
                Err(err) => {
                    warn!(
                        employee = %employee.employee_number,
                        review_type = %kind,
                        operation = "populate_review_type",
                        error = %err,
                        "review population failed for review type"
                    );
                    failures.push(PopulationFailure {
                        employee: employee.employee_number.clone(),
                        review_type: Some(*kind),
                        operation: "populate_review_type",
                        message: err.to_string(),
                    });
                }
            }
        }

        debug!(
            employee = %employee.employee_number,
            created = outcome.created,
            "employee reviews populated"
        );

        Ok(outcome)
    }

    fn reviewer_for(
        &self,
        employee: &EmployeeRecord,
        kind: ReviewKind,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        match kind {
            ReviewKind::SelfReview => Ok(Some(employee.clone())),
            ReviewKind::Supervisor => match &employee.supervisor_id {
                Some(supervisor) if !supervisor.is_blank() => self.organisation.employee(supervisor),
                _ => Ok(None),
            },
            ReviewKind::Peers => self.resolver.peer_for(employee),
            ReviewKind::Subordinates => Ok(self
                .resolver
                .subordinate_for(employee)?
                .filter(|candidate| candidate.employee_number != employee.employee_number)),
            ReviewKind::Superior => self.resolver.superior_for(employee),
        }
    }

    fn populate_review_type(
        &self,
        period: &ReviewPeriod,
        employee: &EmployeeRecord,
        kind: ReviewKind,
        review_type: &ReviewType,
        plan: &EmployeePlan,
    ) -> Result<ReviewTypeOutcome, PopulationError> {
        let mut outcome = ReviewTypeOutcome {
            review_type: kind,
            created: 0,
            reviewer: None,
            skipped: None,
        };

        let Some(reviewer) = self.reviewer_for(employee, kind)? else {
            debug!(
                employee = %employee.employee_number,
                review_type = %kind,
                "no reviewer resolved"
            );
            outcome.skipped = Some(SkipReason::NoCounterpart);
            return Ok(outcome);
        };
        outcome.reviewer = Some(reviewer.employee_number.clone());

        let draft = ReviewDraft {
            subject: employee,
            reviewer: &reviewer,
            period: period.id,
            review_type,
        };
        let mut segments = vec![PopulationSegment {
            key: draft.key(false),
            guard: PopulationGuard::Key,
            reviews: plan
                .behavioral
                .iter()
                .map(|mapping| draft.review(mapping.competency_id, mapping.expected_rating_id, false))
                .collect(),
        }];

        if kind.includes_technical() {
            // Fuzzy selections are guarded per competency so new office mappings top up later runs.
            let guard = match &plan.technical {
                TechnicalSelection::Exact(_) => PopulationGuard::Key,
                TechnicalSelection::Fuzzy(_) => PopulationGuard::Competency,
            };
            segments.push(PopulationSegment {
                key: draft.key(true),
                guard,
                reviews: plan
                    .technical
                    .mappings()
                    .iter()
                    .map(|mapping| draft.review(mapping.competency_id, mapping.expected_rating_id, true))
                    .collect(),
            });
        }

        let stored = self.reviews.insert_segments(segments)?;
        if stored.inserted == 0 {
            outcome.skipped = Some(if stored.already_present {
                SkipReason::AlreadyPopulated
            } else {
                SkipReason::NoCompetencies
            });
            return Ok(outcome);
        }

        outcome.created = stored.inserted;
        Ok(outcome)
    }
}

struct ReviewDraft<'a> {
    subject: &'a EmployeeRecord,
    reviewer: &'a EmployeeRecord,
    period: ReviewPeriodId,
    review_type: &'a ReviewType,
}

impl ReviewDraft<'_> {
    fn key(&self, technical: bool) -> PopulationKey {
        PopulationKey {
            employee: self.subject.employee_number.clone(),
            period: self.period,
            review_type: self.review_type.id,
            technical,
        }
    }

    fn review(
        &self,
        competency_id: CompetencyId,
        expected_rating_id: RatingId,
        technical: bool,
    ) -> CompetencyReview {
        CompetencyReview {
            competency_id,
            employee_number: self.subject.employee_number.clone(),
            employee_name: self.subject.full_name.clone(),
            employee_initial: self.subject.initials(),
            employee_grade: self.subject.grade.clone(),
            employee_department: self.subject.department_name.clone(),
            expected_rating_id,
            reviewer_id: self.reviewer.employee_number.clone(),
            reviewer_name: self.reviewer.full_name.clone(),
            review_period_id: self.period,
            review_type_id: self.review_type.id,
            technical,
            actual_rating_value: 0,
            deleted: false,
        }
    }
}

/// Error raised by the population engine.
#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
