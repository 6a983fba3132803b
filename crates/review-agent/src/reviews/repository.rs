use serde::{Deserialize, Serialize};

use super::domain::{
    BehavioralMapping, CategoryId, Competency, CompetencyCategoryGrading, CompetencyId,
    CompetencyReview, CompetencyReviewProfile, EmployeeId, EmployeeRecord, Grade, GradeGroup,
    GradeGroupId, JobRole, JobRoleId, Rating, ReviewKind, ReviewPeriod, ReviewPeriodId,
    ReviewType, ReviewTypeId, TechnicalMapping, UnitId,
};

/// Staff directory lookups consumed by the hierarchy resolver and population engine.
pub trait EmployeeDirectory: Send + Sync {
    fn employee(&self, id: &EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError>;
    fn in_office(&self, office: &UnitId) -> Result<Vec<EmployeeRecord>, RepositoryError>;
    fn in_division(&self, division: &UnitId) -> Result<Vec<EmployeeRecord>, RepositoryError>;
    fn in_department(&self, department: &UnitId) -> Result<Vec<EmployeeRecord>, RepositoryError>;
    /// Case-insensitive substring match on the job title.
    fn with_job_title(&self, fragment: &str) -> Result<Vec<EmployeeRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<EmployeeRecord>, RepositoryError>;
}

pub trait ReviewPeriodProvider: Send + Sync {
    /// The single active, approved, undeleted period, if any.
    fn current_period(&self) -> Result<Option<ReviewPeriod>, RepositoryError>;
    fn period(&self, id: ReviewPeriodId) -> Result<Option<ReviewPeriod>, RepositoryError>;
}

/// Competency, rating, and review-type reference data.
pub trait CompetencyCatalogue: Send + Sync {
    fn review_types(&self) -> Result<Vec<ReviewType>, RepositoryError>;
    /// Ratings ordered by ascending value.
    fn ratings(&self) -> Result<Vec<Rating>, RepositoryError>;
    fn grade_group_for(&self, grade: &Grade) -> Result<Option<GradeGroup>, RepositoryError>;
    /// First job role whose name contains `name`, compared case-insensitively.
    fn job_role_like(&self, name: &str) -> Result<Option<JobRole>, RepositoryError>;
    fn competency(&self, id: CompetencyId) -> Result<Option<Competency>, RepositoryError>;
    fn behavioral_mappings(
        &self,
        grade_group: GradeGroupId,
    ) -> Result<Vec<BehavioralMapping>, RepositoryError>;
    fn technical_mappings(
        &self,
        office: &UnitId,
        job_role: JobRoleId,
    ) -> Result<Vec<TechnicalMapping>, RepositoryError>;
    /// Every technical mapping registered for the office, regardless of job role.
    fn office_technical_mappings(
        &self,
        office: &UnitId,
    ) -> Result<Vec<TechnicalMapping>, RepositoryError>;
    fn category_grading(
        &self,
        category: CategoryId,
        review_type: ReviewTypeId,
    ) -> Result<Option<CompetencyCategoryGrading>, RepositoryError>;
}

/// Everything the engine reads from the surrounding platform.
pub trait Organisation: EmployeeDirectory + ReviewPeriodProvider + CompetencyCatalogue {}

impl<T> Organisation for T where T: EmployeeDirectory + ReviewPeriodProvider + CompetencyCatalogue {}

/// Resolve a review type by its catalogue name.
pub fn review_type_for<C>(
    catalogue: &C,
    kind: ReviewKind,
) -> Result<Option<ReviewType>, RepositoryError>
where
    C: CompetencyCatalogue + ?Sized,
{
    Ok(catalogue
        .review_types()?
        .into_iter()
        .find(|review_type| review_type.matches(kind)))
}

/// Coarse key under which a subject counts as already populated for a review type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationKey {
    pub employee: EmployeeId,
    pub period: ReviewPeriodId,
    pub review_type: ReviewTypeId,
    pub technical: bool,
}

impl PopulationKey {
    pub fn matches(&self, review: &CompetencyReview) -> bool {
        !review.deleted
            && review.employee_number == self.employee
            && review.review_period_id == self.period
            && review.review_type_id == self.review_type
            && review.technical == self.technical
    }
}

/// How a population segment decides that its reviews are already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationGuard {
    /// The whole segment is skipped once any review matches the key.
    Key,
    /// Each review is skipped when its reviewer already reviews that competency under the key.
    Competency,
}

/// Reviews for one leg of one review type, stored only while their guard is clear.
#[derive(Debug, Clone)]
pub struct PopulationSegment {
    pub key: PopulationKey,
    pub guard: PopulationGuard,
    pub reviews: Vec<CompetencyReview>,
}

impl PopulationSegment {
    /// Whether `review` would duplicate something `existing` already covers.
    pub fn covers(&self, existing: &CompetencyReview, review: &CompetencyReview) -> bool {
        self.key.matches(existing)
            && match self.guard {
                PopulationGuard::Key => true,
                PopulationGuard::Competency => {
                    existing.competency_id == review.competency_id
                        && existing.reviewer_id == review.reviewer_id
                }
            }
    }
}

/// Result of a guarded insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentInsert {
    pub inserted: usize,
    /// At least one guard found existing reviews.
    pub already_present: bool,
}

/// Storage for individual competency reviews.
pub trait ReviewRepository: Send + Sync {
    /// Check every segment's guard and store what is missing in one atomic step, so concurrent
    /// population runs never duplicate a review.
    fn insert_segments(
        &self,
        segments: Vec<PopulationSegment>,
    ) -> Result<SegmentInsert, RepositoryError>;
    /// Bulk load of previously exported reviews, stored as given.
    fn insert_reviews(&self, reviews: Vec<CompetencyReview>) -> Result<usize, RepositoryError>;
    /// Undeleted reviews of one leg (behavioral or technical) for a subject and period.
    fn reviews_for(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
        technical: bool,
    ) -> Result<Vec<CompetencyReview>, RepositoryError>;
}

/// Whether a profile write created a row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileWrite {
    Created,
    Updated,
}

/// Storage for aggregated competency profiles, one row per subject, period, and competency.
pub trait ProfileRepository: Send + Sync {
    /// Store `created` when no row exists for its key, otherwise replace the row with
    /// `updated`; the existence check and the write happen atomically.
    fn upsert_profile(
        &self,
        created: CompetencyReviewProfile,
        updated: CompetencyReviewProfile,
    ) -> Result<ProfileWrite, RepositoryError>;
    fn profiles_for(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<Vec<CompetencyReviewProfile>, RepositoryError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
