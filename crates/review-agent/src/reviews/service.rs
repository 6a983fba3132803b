use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{CompetencyReviewProfile, EmployeeId, EmployeeRecord, ReviewPeriodId};
use super::hierarchy::{CandidatePicker, ResolverError, ThreadRngPicker};
use super::matching::{score_partial_match, PartialMatch};
use super::population::{
    CancellationFlag, PopulationError, PopulationReport, PopulationScope, ReviewPopulationEngine,
};
use super::repository::{Organisation, ProfileRepository, RepositoryError, ReviewRepository};
use super::scoring::{GapReport, ScoreAggregator, ScoringConfig, ScoringError, ScoringOutcome};

/// Service composing counterpart resolution, review population, and score aggregation.
pub struct ReviewAgentService<O, S, K = ThreadRngPicker> {
    population: ReviewPopulationEngine<O, S, K>,
    scoring: ScoreAggregator<O, S>,
}

impl<O, S> ReviewAgentService<O, S, ThreadRngPicker>
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
{
    pub fn new(organisation: Arc<O>, store: Arc<S>, config: ScoringConfig) -> Self {
        Self::with_picker(organisation, store, Arc::new(ThreadRngPicker), config)
    }
}

impl<O, S, K> ReviewAgentService<O, S, K>
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
    K: CandidatePicker + 'static,
{
    pub fn with_picker(
        organisation: Arc<O>,
        store: Arc<S>,
        picker: Arc<K>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            population: ReviewPopulationEngine::new(
                Arc::clone(&organisation),
                Arc::clone(&store),
                picker,
            ),
            scoring: ScoreAggregator::new(organisation, store, config),
        }
    }

    pub fn counterpart(
        &self,
        employee: &EmployeeId,
        relation: Relation,
    ) -> Result<Option<EmployeeRecord>, ReviewServiceError> {
        let resolver = self.population.resolver();
        let selected = match relation {
            Relation::Subordinate => resolver.select_subordinate(employee)?,
            Relation::Peer => resolver.select_peer(employee)?,
            Relation::Superior => resolver.select_superior(employee)?,
        };
        Ok(selected)
    }

    pub fn populate(
        &self,
        scope: &PopulationScope,
        cancel: &CancellationFlag,
    ) -> Result<PopulationReport, ReviewServiceError> {
        Ok(self.population.populate_until_cancelled(scope, cancel)?)
    }

    pub fn calculate(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
        leg: ProfileLeg,
    ) -> Result<ScoringOutcome, ReviewServiceError> {
        let outcome = match leg {
            ProfileLeg::Behavioral => self.scoring.calculate_behavioral(employee, period)?,
            ProfileLeg::Technical => self.scoring.calculate_technical(employee, period)?,
            ProfileLeg::All => self.scoring.calculate_profiles(employee, period)?,
        };
        Ok(outcome)
    }

    pub fn profiles(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<Vec<CompetencyReviewProfile>, ReviewServiceError> {
        Ok(self.scoring.profiles(employee, period)?)
    }

    pub fn gap_report(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<GapReport, ReviewServiceError> {
        Ok(self.scoring.gap_report(employee, period)?)
    }

    pub fn partial_match(&self, left: &str, right: &str) -> PartialMatch {
        score_partial_match(left, right)
    }
}

/// Organisational relationship requested from the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Subordinate,
    Peer,
    Superior,
}

/// Which aggregation to run for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileLeg {
    Behavioral,
    Technical,
    All,
}

/// Error raised by the review agent service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error(transparent)]
    Population(#[from] PopulationError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
