//! In-process collaborators used by the CLI, the HTTP service, and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

use super::domain::{
    BehavioralMapping, CategoryId, Competency, CompetencyCategoryGrading, CompetencyId,
    CompetencyReview, CompetencyReviewProfile, EmployeeId, EmployeeRecord, Grade, GradeGroup,
    GradeGroupId, JobRole, JobRoleId, Rating, ReviewPeriod, ReviewPeriodId, ReviewType,
    ReviewTypeId, TechnicalMapping, UnitId,
};
use super::repository::{
    CompetencyCatalogue, EmployeeDirectory, PopulationGuard, PopulationSegment, ProfileRepository,
    ProfileWrite, RepositoryError, ReviewPeriodProvider, ReviewRepository, SegmentInsert,
};
use super::seed::OrganisationSnapshot;

/// Directory, period, and catalogue provider over a replaceable snapshot.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOrganisation {
    snapshot: Arc<RwLock<OrganisationSnapshot>>,
}

impl InMemoryOrganisation {
    pub fn new(snapshot: OrganisationSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Insert or replace a directory entry, keyed by employee number.
    pub fn upsert_employee(&self, employee: EmployeeRecord) -> Result<(), RepositoryError> {
        let mut guard = self.snapshot.write().map_err(poisoned)?;
        match guard
            .employees
            .iter_mut()
            .find(|existing| existing.employee_number == employee.employee_number)
        {
            Some(existing) => *existing = employee,
            None => guard.employees.push(employee),
        }
        Ok(())
    }

    pub fn replace(&self, snapshot: OrganisationSnapshot) -> Result<(), RepositoryError> {
        *self.snapshot.write().map_err(poisoned)? = snapshot;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, OrganisationSnapshot>, RepositoryError> {
        self.snapshot.read().map_err(poisoned)
    }

    fn employees_where<F>(&self, predicate: F) -> Result<Vec<EmployeeRecord>, RepositoryError>
    where
        F: Fn(&EmployeeRecord) -> bool,
    {
        Ok(self
            .read()?
            .employees
            .iter()
            .filter(|employee| predicate(employee))
            .cloned()
            .collect())
    }
}

impl EmployeeDirectory for InMemoryOrganisation {
    fn employee(&self, id: &EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError> {
        Ok(self
            .read()?
            .employees
            .iter()
            .find(|employee| &employee.employee_number == id)
            .cloned())
    }

    fn in_office(&self, office: &UnitId) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        self.employees_where(|employee| &employee.office_id == office)
    }

    fn in_division(&self, division: &UnitId) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        self.employees_where(|employee| employee.division_id.as_ref() == Some(division))
    }

    fn in_department(&self, department: &UnitId) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        self.employees_where(|employee| employee.department_id.as_ref() == Some(department))
    }

    fn with_job_title(&self, fragment: &str) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        let needle = fragment.to_uppercase();
        self.employees_where(|employee| employee.job_title.to_uppercase().contains(&needle))
    }

    fn all(&self) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        Ok(self.read()?.employees.clone())
    }
}

impl ReviewPeriodProvider for InMemoryOrganisation {
    fn current_period(&self) -> Result<Option<ReviewPeriod>, RepositoryError> {
        Ok(self
            .read()?
            .periods
            .iter()
            .find(|period| period.is_current())
            .cloned())
    }

    fn period(&self, id: ReviewPeriodId) -> Result<Option<ReviewPeriod>, RepositoryError> {
        Ok(self
            .read()?
            .periods
            .iter()
            .find(|period| period.id == id && !period.deleted)
            .cloned())
    }
}

impl CompetencyCatalogue for InMemoryOrganisation {
    fn review_types(&self) -> Result<Vec<ReviewType>, RepositoryError> {
        Ok(self.read()?.review_types.clone())
    }

    fn ratings(&self) -> Result<Vec<Rating>, RepositoryError> {
        let mut ratings = self.read()?.ratings.clone();
        ratings.sort_by_key(|rating| (rating.value, rating.id));
        Ok(ratings)
    }

    fn grade_group_for(&self, grade: &Grade) -> Result<Option<GradeGroup>, RepositoryError> {
        Ok(self
            .read()?
            .grade_groups
            .iter()
            .find(|group| group.grades.iter().any(|code| code.trim() == grade.code()))
            .cloned())
    }

    fn job_role_like(&self, name: &str) -> Result<Option<JobRole>, RepositoryError> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .read()?
            .job_roles
            .iter()
            .find(|role| role.name.to_lowercase().contains(&needle))
            .cloned())
    }

    fn competency(&self, id: CompetencyId) -> Result<Option<Competency>, RepositoryError> {
        Ok(self
            .read()?
            .competencies
            .iter()
            .find(|competency| competency.id == id)
            .cloned())
    }

    fn behavioral_mappings(
        &self,
        grade_group: GradeGroupId,
    ) -> Result<Vec<BehavioralMapping>, RepositoryError> {
        Ok(self
            .read()?
            .behavioral_mappings
            .iter()
            .filter(|mapping| mapping.grade_group_id == grade_group)
            .cloned()
            .collect())
    }

    fn technical_mappings(
        &self,
        office: &UnitId,
        job_role: JobRoleId,
    ) -> Result<Vec<TechnicalMapping>, RepositoryError> {
        Ok(self
            .read()?
            .technical_mappings
            .iter()
            .filter(|mapping| &mapping.office_id == office && mapping.job_role_id == job_role)
            .cloned()
            .collect())
    }

    fn office_technical_mappings(
        &self,
        office: &UnitId,
    ) -> Result<Vec<TechnicalMapping>, RepositoryError> {
        Ok(self
            .read()?
            .technical_mappings
            .iter()
            .filter(|mapping| &mapping.office_id == office)
            .cloned()
            .collect())
    }

    fn category_grading(
        &self,
        category: CategoryId,
        review_type: ReviewTypeId,
    ) -> Result<Option<CompetencyCategoryGrading>, RepositoryError> {
        Ok(self
            .read()?
            .gradings
            .iter()
            .find(|grading| grading.category_id == category && grading.review_type_id == review_type)
            .cloned())
    }
}

type ProfileKey = (EmployeeId, ReviewPeriodId, CompetencyId);

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("in-memory store lock poisoned".to_string())
}

fn profile_key(profile: &CompetencyReviewProfile) -> ProfileKey {
    (
        profile.employee_number.clone(),
        profile.review_period_id,
        profile.competency_id,
    )
}

/// Review and profile store; also stands in for the rating submission flow.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReviewStore {
    reviews: Arc<Mutex<Vec<CompetencyReview>>>,
    profiles: Arc<Mutex<HashMap<ProfileKey, CompetencyReviewProfile>>>,
}

impl InMemoryReviewStore {
    pub fn reviews(&self) -> Result<Vec<CompetencyReview>, RepositoryError> {
        Ok(self.lock_reviews()?.clone())
    }

    /// Record a submitted rating on every matching undeleted review, returning how many changed.
    pub fn record_rating(
        &self,
        employee: &EmployeeId,
        reviewer: &EmployeeId,
        competency: CompetencyId,
        period: ReviewPeriodId,
        value: u32,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.lock_reviews()?;
        let mut updated = 0;
        for review in guard.iter_mut().filter(|review| {
            !review.deleted
                && &review.employee_number == employee
                && &review.reviewer_id == reviewer
                && review.competency_id == competency
                && review.review_period_id == period
        }) {
            review.actual_rating_value = value;
            updated += 1;
        }
        Ok(updated)
    }

    fn lock_reviews(&self) -> Result<MutexGuard<'_, Vec<CompetencyReview>>, RepositoryError> {
        self.reviews.lock().map_err(poisoned)
    }

    fn lock_profiles(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ProfileKey, CompetencyReviewProfile>>, RepositoryError> {
        self.profiles.lock().map_err(poisoned)
    }
}

impl ReviewRepository for InMemoryReviewStore {
    fn insert_segments(
        &self,
        segments: Vec<PopulationSegment>,
    ) -> Result<SegmentInsert, RepositoryError> {
        let mut guard = self.lock_reviews()?;
        let mut result = SegmentInsert::default();

        for segment in segments {
            if segment.guard == PopulationGuard::Key {
                if guard.iter().any(|existing| segment.key.matches(existing)) {
                    result.already_present = true;
                    continue;
                }
                result.inserted += segment.reviews.len();
                guard.extend(segment.reviews);
                continue;
            }

            for review in &segment.reviews {
                if guard.iter().any(|existing| segment.covers(existing, review)) {
                    result.already_present = true;
                } else {
                    guard.push(review.clone());
                    result.inserted += 1;
                }
            }
        }

        Ok(result)
    }

    fn insert_reviews(&self, reviews: Vec<CompetencyReview>) -> Result<usize, RepositoryError> {
        let count = reviews.len();
        self.lock_reviews()?.extend(reviews);
        Ok(count)
    }

    fn reviews_for(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
        technical: bool,
    ) -> Result<Vec<CompetencyReview>, RepositoryError> {
        let guard = self.lock_reviews()?;
        Ok(guard
            .iter()
            .filter(|review| {
                !review.deleted
                    && &review.employee_number == employee
                    && review.review_period_id == period
                    && review.technical == technical
            })
            .cloned()
            .collect())
    }
}

impl ProfileRepository for InMemoryReviewStore {
    fn upsert_profile(
        &self,
        created: CompetencyReviewProfile,
        updated: CompetencyReviewProfile,
    ) -> Result<ProfileWrite, RepositoryError> {
        let mut guard = self.lock_profiles()?;
        match guard.get_mut(&profile_key(&updated)) {
            Some(existing) => {
                *existing = updated;
                Ok(ProfileWrite::Updated)
            }
            None => {
                guard.insert(profile_key(&created), created);
                Ok(ProfileWrite::Created)
            }
        }
    }

    fn profiles_for(
        &self,
        employee: &EmployeeId,
        period: ReviewPeriodId,
    ) -> Result<Vec<CompetencyReviewProfile>, RepositoryError> {
        let guard = self.lock_profiles()?;
        let mut profiles: Vec<CompetencyReviewProfile> = guard
            .values()
            .filter(|profile| &profile.employee_number == employee && profile.review_period_id == period)
            .cloned()
            .collect();
        profiles.sort_by_key(|profile| profile.competency_id);
        Ok(profiles)
    }
}
