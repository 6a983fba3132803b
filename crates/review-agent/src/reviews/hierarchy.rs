//! Counterpart selection for peer, subordinate, and superior reviews.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use super::domain::{EmployeeId, EmployeeRecord};
use super::repository::{EmployeeDirectory, RepositoryError};

/// Grade boundary applied when the subject is a Permanent Member.
const PERMANENT_MEMBER_RANK_BOUNDARY: u32 = 4;

/// Source of randomness for choosing one counterpart out of an eligible set.
pub trait CandidatePicker: Send + Sync {
    /// Index into a candidate list of length `len`, or `None` when `len` is zero.
    fn pick(&self, len: usize) -> Option<usize>;
}

/// Uniform choice backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngPicker;

impl CandidatePicker for ThreadRngPicker {
    fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..len))
    }
}

/// Organisational scope searched for candidates, narrowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeLevel {
    Office,
    Division,
    Department,
}

impl ScopeLevel {
    pub const fn fallback_order() -> [Self; 3] {
        [Self::Office, Self::Division, Self::Department]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::Division => "division",
            Self::Department => "department",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Subordinate,
    Peer,
    Superior,
}

impl Relation {
    const fn label(self) -> &'static str {
        match self {
            Self::Subordinate => "subordinate",
            Self::Peer => "peer",
            Self::Superior => "superior",
        }
    }
}

/// Resolves organisational counterparts against the staff directory.
pub struct OrgHierarchyResolver<D, P = ThreadRngPicker> {
    directory: Arc<D>,
    picker: Arc<P>,
}

impl<D, P> Clone for OrgHierarchyResolver<D, P> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            picker: Arc::clone(&self.picker),
        }
    }
}

impl<D> OrgHierarchyResolver<D, ThreadRngPicker>
where
    D: EmployeeDirectory,
{
    pub fn with_thread_rng(directory: Arc<D>) -> Self {
        Self::new(directory, Arc::new(ThreadRngPicker))
    }
}

impl<D, P> OrgHierarchyResolver<D, P>
where
    D: EmployeeDirectory,
    P: CandidatePicker,
{
    pub fn new(directory: Arc<D>, picker: Arc<P>) -> Self {
        Self { directory, picker }
    }

    pub fn select_subordinate(
        &self,
        employee: &EmployeeId,
    ) -> Result<Option<EmployeeRecord>, ResolverError> {
        let subject = self.subject(employee)?;
        Ok(self.subordinate_for(&subject)?)
    }

    pub fn select_peer(
        &self,
        employee: &EmployeeId,
    ) -> Result<Option<EmployeeRecord>, ResolverError> {
        let subject = self.subject(employee)?;
        Ok(self.peer_for(&subject)?)
    }

    pub fn select_superior(
        &self,
        employee: &EmployeeId,
    ) -> Result<Option<EmployeeRecord>, ResolverError> {
        let subject = self.subject(employee)?;
        Ok(self.superior_for(&subject)?)
    }

    pub fn subordinate_for(
        &self,
        subject: &EmployeeRecord,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let candidates = self.subordinate_candidates(subject)?;
        Ok(self.choose(candidates))
    }

    pub fn peer_for(
        &self,
        subject: &EmployeeRecord,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let candidates = self.peer_candidates(subject)?;
        Ok(self.choose(candidates))
    }

    pub fn superior_for(
        &self,
        subject: &EmployeeRecord,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let candidates = self.superior_candidates(subject)?;
        Ok(self.choose(candidates))
    }

    /// Eligible subordinates; governors draw from the department heads reporting to them.
    pub fn subordinate_candidates(
        &self,
        subject: &EmployeeRecord,
    ) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        if self.is_governor(subject)? {
            let reports = self
                .directory
                .all()?
                .into_iter()
                .filter(|candidate| candidate.heads_own_department() && !candidate.is_governor())
                .filter(|candidate| {
                    candidate.head_of_office.as_ref() == Some(&subject.employee_number)
                        || candidate.supervisor_id.as_ref() == Some(&subject.employee_number)
                });
            return Ok(distinct_others(subject, reports));
        }

        self.first_populated_level(subject, Relation::Subordinate)
    }

    /// Eligible peers; governors are peers of every other governor.
    pub fn peer_candidates(
        &self,
        subject: &EmployeeRecord,
    ) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        if self.is_governor(subject)? {
            let governors = self
                .directory
                .with_job_title(EmployeeRecord::GOVERNOR_MARKER)?;
            return Ok(distinct_others(subject, governors));
        }

        self.first_populated_level(subject, Relation::Peer)
    }

    pub fn superior_candidates(
        &self,
        subject: &EmployeeRecord,
    ) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        self.first_populated_level(subject, Relation::Superior)
    }

    fn subject(&self, employee: &EmployeeId) -> Result<EmployeeRecord, ResolverError> {
        self.directory
            .employee(employee)?
            .ok_or_else(|| ResolverError::UnknownEmployee(employee.clone()))
    }

    fn is_governor(&self, subject: &EmployeeRecord) -> Result<bool, RepositoryError> {
        Ok(self
            .directory
            .with_job_title(EmployeeRecord::GOVERNOR_MARKER)?
            .iter()
            .any(|governor| governor.employee_number == subject.employee_number))
    }

    /// Walk office, division, then department, stopping at the first level with candidates.
    fn first_populated_level(
        &self,
        subject: &EmployeeRecord,
        relation: Relation,
    ) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        for level in ScopeLevel::fallback_order() {
            let members = self.members(subject, level)?;
            let candidates: Vec<EmployeeRecord> = distinct_others(subject, members)
                .into_iter()
                .filter(|candidate| subject.head_of_office.as_ref() != Some(&candidate.employee_number))
                .filter(|candidate| eligible(subject, candidate, relation, level))
                .collect();

            if !candidates.is_empty() {
                debug!(
                    employee = %subject.employee_number,
                    relation = relation.label(),
                    level = level.label(),
                    candidates = candidates.len(),
                    "counterpart candidates resolved"
                );
                return Ok(candidates);
            }
        }

        debug!(
            employee = %subject.employee_number,
            relation = relation.label(),
            "no counterpart candidates at any level"
        );
        Ok(Vec::new())
    }

    fn members(
        &self,
        subject: &EmployeeRecord,
        level: ScopeLevel,
    ) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        match level {
            ScopeLevel::Office => self.directory.in_office(&subject.office_id),
            ScopeLevel::Division => match &subject.division_id {
                Some(division) => self.directory.in_division(division),
                None => Ok(Vec::new()),
            },
            ScopeLevel::Department => match &subject.department_id {
                Some(department) => self.directory.in_department(department),
                None => Ok(Vec::new()),
            },
        }
    }

    fn choose(&self, mut candidates: Vec<EmployeeRecord>) -> Option<EmployeeRecord> {
        let index = self.picker.pick(candidates.len())?;
        if index < candidates.len() {
            Some(candidates.swap_remove(index))
        } else {
            None
        }
    }
}

/// Drop blank identifiers, the subject, and repeated employees, keeping first occurrences.
fn distinct_others<I>(subject: &EmployeeRecord, candidates: I) -> Vec<EmployeeRecord>
where
    I: IntoIterator<Item = EmployeeRecord>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| !candidate.employee_number.is_blank())
        .filter(|candidate| candidate.employee_number != subject.employee_number)
        .filter(|candidate| seen.insert(candidate.employee_number.clone()))
        .collect()
}

fn eligible(
    subject: &EmployeeRecord,
    candidate: &EmployeeRecord,
    relation: Relation,
    level: ScopeLevel,
) -> bool {
    if relation == Relation::Superior
        && subject.supervisor_id.as_ref() == Some(&candidate.employee_number)
    {
        return false;
    }

    let subject_is_pm = subject.grade.is_permanent_member();

    if candidate.grade.is_permanent_member() {
        // The department is the last level searched; a Permanent Member there roots the hierarchy.
        return relation == Relation::Superior && level == ScopeLevel::Department && !subject_is_pm;
    }

    let Some(rank) = candidate.grade.rank() else {
        return false;
    };

    match relation {
        Relation::Subordinate if subject_is_pm => rank > PERMANENT_MEMBER_RANK_BOUNDARY,
        Relation::Superior if subject_is_pm => rank < PERMANENT_MEMBER_RANK_BOUNDARY,
        Relation::Peer if subject_is_pm => false,
        Relation::Subordinate => subject.grade.rank().is_some_and(|own| rank > own),
        Relation::Peer => candidate.grade.code() == subject.grade.code(),
        Relation::Superior => subject.grade.rank().is_some_and(|own| rank < own),
    }
}

/// Error raised when resolving counterparts by employee number.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("employee {0} not found in directory")]
    UnknownEmployee(EmployeeId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
