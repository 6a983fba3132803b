use std::cmp::Ordering;

use serde::Serialize;

use crate::reviews::domain::{CompetencyReviewProfile, EmployeeId, ReviewPeriodId};

/// Competencies where an employee falls short of the expected rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReport {
    pub employee: EmployeeId,
    pub period: ReviewPeriodId,
    pub assessed: usize,
    pub with_gap: usize,
    pub total_gap: f64,
    /// Largest gap first; ties ordered by competency.
    pub gaps: Vec<CompetencyReviewProfile>,
}

impl GapReport {
    pub fn from_profiles(
        employee: EmployeeId,
        period: ReviewPeriodId,
        profiles: Vec<CompetencyReviewProfile>,
    ) -> Self {
        let assessed = profiles.len();
        let mut gaps: Vec<CompetencyReviewProfile> =
            profiles.into_iter().filter(|profile| profile.has_gap).collect();
        gaps.sort_by(|left, right| {
            right
                .competency_gap
                .partial_cmp(&left.competency_gap)
                .unwrap_or(Ordering::Equal)
                .then(left.competency_id.cmp(&right.competency_id))
        });

        Self {
            employee,
            period,
            assessed,
            with_gap: gaps.len(),
            total_gap: gaps.iter().map(|profile| profile.competency_gap).sum(),
            gaps,
        }
    }
}
