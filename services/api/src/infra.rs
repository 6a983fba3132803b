use crate::demo::sample_snapshot;
use metrics_exporter_prometheus::PrometheusHandle;
use review_agent::config::ReviewConfig;
use review_agent::error::AppError;
use review_agent::reviews::seed::parse_directory;
use review_agent::reviews::{
    EmployeeId, InMemoryOrganisation, InMemoryReviewStore, OrganisationSnapshot, PopulationScope,
    ReviewAgentService, UnitId,
};
use std::fs::File;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type ReviewService = ReviewAgentService<InMemoryOrganisation, InMemoryReviewStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Engine wired to in-memory collaborators, with handles kept for direct access.
pub(crate) struct ReviewRuntime {
    pub(crate) service: Arc<ReviewService>,
    pub(crate) organisation: Arc<InMemoryOrganisation>,
    pub(crate) store: Arc<InMemoryReviewStore>,
}

impl ReviewRuntime {
    pub(crate) fn from_config(config: &ReviewConfig) -> Result<Self, AppError> {
        Ok(Self::from_snapshot(load_snapshot(config)?, config))
    }

    pub(crate) fn from_snapshot(snapshot: OrganisationSnapshot, config: &ReviewConfig) -> Self {
        let organisation = Arc::new(InMemoryOrganisation::new(snapshot));
        let store = Arc::new(InMemoryReviewStore::default());
        let service = Arc::new(ReviewAgentService::new(
            Arc::clone(&organisation),
            Arc::clone(&store),
            config.scoring,
        ));
        Self {
            service,
            organisation,
            store,
        }
    }
}

/// Seed data from the configured files, falling back to the bundled sample organisation.
pub(crate) fn load_snapshot(config: &ReviewConfig) -> Result<OrganisationSnapshot, AppError> {
    let (snapshot, source) = match (&config.catalogue_json, &config.directory_csv) {
        (Some(catalogue), directory) => (
            OrganisationSnapshot::load(catalogue, directory.as_deref())?,
            "configured catalogue",
        ),
        (None, Some(directory)) => {
            let mut snapshot = sample_snapshot()?;
            snapshot.employees = parse_directory(File::open(directory)?)?;
            (snapshot, "sample catalogue with configured directory")
        }
        (None, None) => (sample_snapshot()?, "sample organisation"),
    };

    info!(
        source,
        employees = snapshot.employees.len(),
        periods = snapshot.periods.len(),
        "organisation snapshot loaded"
    );
    Ok(snapshot)
}

/// Narrowest scope named on the command line, or the whole organisation.
pub(crate) fn scope_from_flags(
    employee: Option<String>,
    office: Option<String>,
    division: Option<String>,
    department: Option<String>,
) -> PopulationScope {
    if let Some(id) = employee {
        PopulationScope::Employee(EmployeeId::new(id))
    } else if let Some(id) = office {
        PopulationScope::Office(UnitId::new(id))
    } else if let Some(id) = division {
        PopulationScope::Division(UnitId::new(id))
    } else if let Some(id) = department {
        PopulationScope::Department(UnitId::new(id))
    } else {
        PopulationScope::Organisation
    }
}
