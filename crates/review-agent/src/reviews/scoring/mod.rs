//! Aggregation of recorded ratings into per-competency profiles.

mod config;
mod report;
mod rules;

pub use config::{ScoringConfig, DEFAULT_OTHER_WEIGHT, DEFAULT_SELF_WEIGHT};
pub use report::GapReport;
pub use rules::{mean, round_score, weighted_score, CompetencyGap};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::domain::{
    CompetencyId, CompetencyReview, CompetencyReviewProfile, EmployeeId, EmployeeRecord, Rating,
    RatingId, ReviewKind, ReviewPeriodId, ReviewTypeId,
};
use super::repository::{
    review_type_for, Organisation, ProfileRepository, ProfileWrite, RepositoryError,
    ReviewRepository,
};

/// Profiles written by one aggregation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoringOutcome {
    pub created: usize,
    pub updated: usize,
    pub profiles: Vec<CompetencyReviewProfile>,
}

impl ScoringOutcome {
    fn merge(mut self, other: ScoringOutcome) -> Self {
        self.created += other.created;
        self.updated += other.updated;
        self.profiles.extend(other.profiles);
        self
    }
}

/// Computed score for one competency before it is written to a profile.
struct CompetencyScore {
    competency_id: CompetencyId,
    expected_rating_id: RatingId,
    technical: bool,
    /// Value stored on a newly created profile.
    created_score: f64,
    /// Value stored when the profile already exists.
    updated_score: f64,
    rounded: f64,
}

/// Builds competency profiles from the behavioral and technical reviews of a period.
pub struct ScoreAggregator<O, S> {
    organisation: Arc<O>,
    store: Arc<S>,
    config: ScoringConfig,
}

impl<O, S> ScoreAggregator<O, S>
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
{
    pub fn new(organisation: Arc<O>, store: Arc<S>, config: ScoringConfig) -> Self {
        Self {
            organisation,
            store,
            config,
        }
    }

    /// Average every rated behavioral review per competency and upsert the profiles.
    pub fn calculate_behavioral(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<ScoringOutcome, ScoringError> {
        let Some(subject) = self.subject(employee, period)? else {
            return Ok(ScoringOutcome::default());
        };

        let reviews: Vec<CompetencyReview> = self
            .store
            .reviews_for(employee, period, false)?
            .into_iter()
            .filter(CompetencyReview::is_rated)
            .collect();

        let scores = group_by_competency(&reviews)
            .into_iter()
            .map(|(competency_id, group)| {
                let average = mean(group.iter().map(|review| review.actual_rating_value));
                let rounded = round_score(average);
                CompetencyScore {
                    competency_id,
                    expected_rating_id: group[0].expected_rating_id,
                    technical: false,
                    created_score: rounded,
                    updated_score: rounded,
                    rounded,
                }
            })
            .collect::<Vec<_>>();

        let outcome = self.write_profiles(&subject, period, scores)?;
        info!(
            employee = %employee,
            period = %period,
            operation = "calculate_behavioral",
            created = outcome.created,
            updated = outcome.updated,
            "behavioral profiles calculated"
        );
        Ok(outcome)
    }

    /// Combine self and other technical ratings per competency using category weights.
    ///
    /// A new profile stores the unrounded weighted score while an existing one is updated with
    /// the rounded score; callers comparing successive runs should expect that difference.
    pub fn calculate_technical(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<ScoringOutcome, ScoringError> {
        let Some(subject) = self.subject(employee, period)? else {
            return Ok(ScoringOutcome::default());
        };

        let reviews = self.store.reviews_for(employee, period, true)?;
        let self_type = review_type_for(self.organisation.as_ref(), ReviewKind::SelfReview)?;
        let supervisor_type = review_type_for(self.organisation.as_ref(), ReviewKind::Supervisor)?;

        let mut scores = Vec::new();
        for (competency_id, group) in group_by_competency(&reviews) {
            let self_weight = self.weight(
                competency_id,
                self_type.as_ref().map(|review_type| review_type.id),
                self.config.default_self_weight,
            )?;
            let other_weight = self.weight(
                competency_id,
                supervisor_type.as_ref().map(|review_type| review_type.id),
                self.config.default_other_weight,
            )?;

            let self_average = mean(
                group
                    .iter()
                    .filter(|review| review.is_self_review())
                    .map(|review| review.actual_rating_value),
            );
            let other_average = mean(
                group
                    .iter()
                    .filter(|review| !review.is_self_review())
                    .map(|review| review.actual_rating_value),
            );

            let weighted = weighted_score(self_average, self_weight, other_average, other_weight);
            let rounded = round_score(weighted);
            debug!(
                employee = %employee,
                competency = %competency_id,
                self_average,
                other_average,
                self_weight,
                other_weight,
                weighted,
                "technical competency weighted"
            );

            scores.push(CompetencyScore {
                competency_id,
                expected_rating_id: group[0].expected_rating_id,
                technical: true,
                created_score: weighted,
                updated_score: rounded,
                rounded,
            });
        }

        let outcome = self.write_profiles(&subject, period, scores)?;
        info!(
            employee = %employee,
            period = %period,
            operation = "calculate_technical",
            created = outcome.created,
            updated = outcome.updated,
            "technical profiles calculated"
        );
        Ok(outcome)
    }

    /// Run the behavioral then the technical aggregation.
    pub fn calculate_profiles(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<ScoringOutcome, ScoringError> {
        let behavioral = self.calculate_behavioral(employee, period)?;
        let technical = self.calculate_technical(employee, period)?;
        Ok(behavioral.merge(technical))
    }

    pub fn profiles(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<Vec<CompetencyReviewProfile>, ScoringError> {
        Ok(self.store.profiles_for(employee, period)?)
    }

    pub fn gap_report(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<GapReport, ScoringError> {
        let profiles = self.store.profiles_for(employee, period)?;
        Ok(GapReport::from_profiles(employee.clone(), period, profiles))
    }

    /// The subject record, or `None` when there is nothing to aggregate.
    fn subject(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        if self.organisation.current_period()?.is_none() {
            debug!(employee = %employee, "no current review period; skipping aggregation");
            return Ok(None);
        }
        if self.organisation.period(period)?.is_none() {
            debug!(employee = %employee, period = %period, "unknown review period");
            return Ok(None);
        }

        let subject = self.organisation.employee(employee)?;
        if subject.is_none() {
            debug!(employee = %employee, "employee not in directory; skipping aggregation");
        }
        Ok(subject)
    }

    fn weight(
        &self,
        competency_id: CompetencyId,
        review_type: Option<ReviewTypeId>,
        default: f64,
    ) -> Result<f64, RepositoryError> {
        let Some(review_type) = review_type else {
            return Ok(default);
        };
        let Some(competency) = self.organisation.competency(competency_id)? else {
            return Ok(default);
        };

        Ok(self
            .organisation
            .category_grading(competency.category_id, review_type)?
            .map(|grading| grading.weight_percentage)
            .unwrap_or(default))
    }

    fn write_profiles(
        &self,
        subject: &EmployeeRecord,
        period: ReviewPeriodId,
        scores: Vec<CompetencyScore>,
    ) -> Result<ScoringOutcome, RepositoryError> {
        let mut outcome = ScoringOutcome::default();
        if scores.is_empty() {
            return Ok(outcome);
        }

        let ratings = self.organisation.ratings()?;

        for score in scores {
            let created = self.profile(subject, period, &ratings, &score, score.created_score)?;
            let updated = CompetencyReviewProfile {
                average_score: score.updated_score,
                ..created.clone()
            };

            let profile = match self.store.upsert_profile(created.clone(), updated.clone())? {
                ProfileWrite::Created => {
                    outcome.created += 1;
                    created
                }
                ProfileWrite::Updated => {
                    outcome.updated += 1;
                    updated
                }
            };
            outcome.profiles.push(profile);
        }

        Ok(outcome)
    }

    fn profile(
        &self,
        subject: &EmployeeRecord,
        period: ReviewPeriodId,
        ratings: &[Rating],
        score: &CompetencyScore,
        average_score: f64,
    ) -> Result<CompetencyReviewProfile, RepositoryError> {
        let competency_name = self
            .organisation
            .competency(score.competency_id)?
            .map(|competency| competency.name)
            .unwrap_or_default();

        let expected = ratings
            .iter()
            .find(|rating| rating.id == score.expected_rating_id);
        let expected_value = expected.map(|rating| rating.value).unwrap_or_default();

        // Scores are never negative, so the rounded value converts without loss.
        let average_value = score.rounded.max(0.0) as u32;
        let average = rating_for_value(ratings, average_value);
        let gap = CompetencyGap::between(f64::from(expected_value), f64::from(average_value));

        Ok(CompetencyReviewProfile {
            employee_number: subject.employee_number.clone(),
            employee_name: subject.full_name.clone(),
            employee_grade: subject.grade.clone(),
            office_id: subject.office_id.clone(),
            office_name: subject.office_name.clone(),
            division_id: subject.division_id.clone(),
            department_id: subject.department_id.clone(),
            department_name: subject.department_name.clone(),
            review_period_id: period,
            competency_id: score.competency_id,
            competency_name,
            technical: score.technical,
            expected_rating_id: score.expected_rating_id,
            expected_rating_name: expected.map(|rating| rating.name.clone()).unwrap_or_default(),
            expected_rating_value: expected_value,
            average_rating_id: average.map(|rating| rating.id).unwrap_or(RatingId::FALLBACK),
            average_rating_name: average.map(|rating| rating.name.clone()).unwrap_or_default(),
            average_rating_value: average_value,
            average_score,
            competency_gap: gap.gap,
            has_gap: gap.has_gap,
        })
    }
}

/// Rating whose value equals `value`, else the fallback rating.
fn rating_for_value(ratings: &[Rating], value: u32) -> Option<&Rating> {
    ratings
        .iter()
        .find(|rating| rating.value == value)
        .or_else(|| ratings.iter().find(|rating| rating.id == RatingId::FALLBACK))
}

fn group_by_competency(reviews: &[CompetencyReview]) -> BTreeMap<CompetencyId, Vec<&CompetencyReview>> {
    let mut groups: BTreeMap<CompetencyId, Vec<&CompetencyReview>> = BTreeMap::new();
    for review in reviews {
        groups.entry(review.competency_id).or_default().push(review);
    }
    groups
}

/// Error raised by the score aggregator.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
