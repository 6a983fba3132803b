//! 360-degree review agent: counterpart resolution, review population, and score aggregation.
//!
//! The engine reads the staff directory and competency catalogue through the traits in
//! [`repository`] and writes reviews and profiles back through the same seam, so every component
//! can be exercised against the in-memory collaborators in [`memory`].

pub mod domain;
pub mod hierarchy;
pub mod matching;
pub mod memory;
pub mod population;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod seed;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BehavioralMapping, CategoryId, Competency, CompetencyCategoryGrading, CompetencyId,
    CompetencyReview, CompetencyReviewProfile, EmployeeId, EmployeeRecord, Grade, GradeGroup,
    GradeGroupId, JobRole, JobRoleId, Rating, RatingId, ReviewKind, ReviewPeriod, ReviewPeriodId,
    ReviewType, ReviewTypeId, TechnicalMapping, UnitId,
};
pub use hierarchy::{CandidatePicker, OrgHierarchyResolver, ResolverError, ThreadRngPicker};
pub use matching::{is_partial_match, score_partial_match, PartialMatch};
pub use memory::{InMemoryOrganisation, InMemoryReviewStore};
pub use population::{
    CancellationFlag, EmployeeOutcome, PopulationError, PopulationFailure, PopulationReport,
    PopulationScope, ReviewPopulationEngine, ReviewTypeOutcome, SkipReason, TechnicalSelection,
};
pub use repository::{
    CompetencyCatalogue, EmployeeDirectory, Organisation, PopulationGuard, PopulationKey,
    PopulationSegment, ProfileRepository, ProfileWrite, RepositoryError, ReviewPeriodProvider,
    ReviewRepository, SegmentInsert,
};
pub use router::review_router;
pub use scoring::{GapReport, ScoreAggregator, ScoringConfig, ScoringError, ScoringOutcome};
pub use seed::{OrganisationSnapshot, SeedError};
pub use service::{ProfileLeg, Relation, ReviewAgentService, ReviewServiceError};
