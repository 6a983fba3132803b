use crate::commands::{render_gap_report, render_population_report};
use crate::infra::ReviewRuntime;
use clap::Args;
use review_agent::config::ReviewConfig;
use review_agent::error::AppError;
use review_agent::reviews::seed::parse_directory;
use review_agent::reviews::{
    CancellationFlag, EmployeeId, OrganisationSnapshot, PopulationScope, ProfileLeg, Relation,
    ReviewPeriodProvider, ReviewServiceError, ScoringConfig, SeedError,
};

const SAMPLE_CATALOGUE: &str = include_str!("../../../crates/review-agent/fixtures/catalogue.json");
const SAMPLE_DIRECTORY: &str = include_str!("../../../crates/review-agent/fixtures/directory.csv");

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Employee whose counterparts and gap report are shown
    #[arg(long, default_value = "S011")]
    pub(crate) employee: String,
    /// Rating recorded on the employee's self reviews
    #[arg(long, default_value_t = 4)]
    pub(crate) self_rating: u32,
    /// Rating recorded on every other review of the employee
    #[arg(long, default_value_t = 3)]
    pub(crate) other_rating: u32,
}

/// Treasury and executive staff with a one-period competency catalogue.
pub(crate) fn sample_snapshot() -> Result<OrganisationSnapshot, SeedError> {
    let mut snapshot = OrganisationSnapshot::from_json_reader(SAMPLE_CATALOGUE.as_bytes())?;
    snapshot.employees = parse_directory(SAMPLE_DIRECTORY.as_bytes())?;
    Ok(snapshot)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        employee,
        self_rating,
        other_rating,
    } = args;

    let config = ReviewConfig {
        directory_csv: None,
        catalogue_json: None,
        scoring: ScoringConfig::default(),
    };
    let runtime = ReviewRuntime::from_snapshot(sample_snapshot()?, &config);
    let subject = EmployeeId::new(employee);

    println!("360-degree review demo");
    let period = runtime
        .organisation
        .current_period()
        .map_err(ReviewServiceError::from)?;
    let Some(period) = period else {
        println!("Sample catalogue has no current review period.");
        return Ok(());
    };
    println!("Current period: {} ({})", period.name, period.id);

    println!("\nCounterparts for {subject}");
    for relation in [Relation::Subordinate, Relation::Peer, Relation::Superior] {
        match runtime.service.counterpart(&subject, relation)? {
            Some(record) => println!(
                "- {relation:?}: {} {} (grade {}, {})",
                record.employee_number, record.full_name, record.grade, record.job_title
            ),
            None => println!("- {relation:?}: nobody eligible"),
        }
    }

    println!();
    let report = runtime
        .service
        .populate(&PopulationScope::Organisation, &CancellationFlag::new())?;
    render_population_report(&PopulationScope::Organisation.label(), &report);

    let reviews = runtime
        .store
        .reviews()
        .map_err(ReviewServiceError::from)?;
    let mut rated = 0;
    for review in reviews
        .iter()
        .filter(|review| review.employee_number == subject)
    {
        let value = if review.is_self_review() {
            self_rating
        } else {
            other_rating
        };
        rated += runtime
            .store
            .record_rating(
                &subject,
                &review.reviewer_id,
                review.competency_id,
                period.id,
                value,
            )
            .map_err(ReviewServiceError::from)?;
    }
    println!("\nRecorded sample ratings on {rated} reviews of {subject}");

    let outcome = runtime
        .service
        .calculate(&subject, period.id, ProfileLeg::All)?;
    println!(
        "Profiles: {} created, {} updated",
        outcome.created, outcome.updated
    );
    for profile in &outcome.profiles {
        println!(
            "- {}: average {:.2} -> {} (expected {})",
            profile.competency_name,
            profile.average_score,
            profile.average_rating_name,
            profile.expected_rating_name
        );
    }

    println!();
    let gaps = runtime.service.gap_report(&subject, period.id)?;
    render_gap_report(&gaps);

    Ok(())
}
