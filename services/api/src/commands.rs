use crate::infra::{scope_from_flags, ReviewRuntime};
use clap::{Args, ValueEnum};
use review_agent::config::AppConfig;
use review_agent::error::AppError;
use review_agent::reviews::{
    score_partial_match, CancellationFlag, CompetencyReview, EmployeeId, GapReport,
    PopulationReport, ProfileLeg, ReviewPeriodId, ReviewPeriodProvider, ReviewRepository,
    ReviewServiceError, SeedError,
};
use review_agent::telemetry;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct PopulateArgs {
    /// Populate a single employee
    #[arg(long, conflicts_with_all = ["office", "division", "department"])]
    pub(crate) employee: Option<String>,
    /// Populate every employee in an office
    #[arg(long, conflicts_with_all = ["division", "department"])]
    pub(crate) office: Option<String>,
    /// Populate every employee in a division
    #[arg(long, conflicts_with = "department")]
    pub(crate) division: Option<String>,
    /// Populate every employee in a department
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Write the created review records to this JSON file
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Employee number to aggregate
    #[arg(long)]
    pub(crate) employee: String,
    /// Review period id (defaults to the current period)
    #[arg(long)]
    pub(crate) period: Option<u32>,
    /// Rated review records, in the format written by `populate --output`
    #[arg(long)]
    pub(crate) reviews: Option<PathBuf>,
    /// Which aggregation to run
    #[arg(long, value_enum, default_value_t = LegArg::All)]
    pub(crate) leg: LegArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LegArg {
    Behavioral,
    Technical,
    All,
}

impl From<LegArg> for ProfileLeg {
    fn from(value: LegArg) -> Self {
        match value {
            LegArg::Behavioral => ProfileLeg::Behavioral,
            LegArg::Technical => ProfileLeg::Technical,
            LegArg::All => ProfileLeg::All,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// First descriptor, e.g. "Finance.Treasury Operations.Senior Accountant"
    pub(crate) left: String,
    /// Second descriptor
    pub(crate) right: String,
}

pub(crate) fn run_populate(args: PopulateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let runtime = ReviewRuntime::from_config(&config.reviews)?;

    let PopulateArgs {
        employee,
        office,
        division,
        department,
        output,
    } = args;
    let scope = scope_from_flags(employee, office, division, department);

    let report = runtime.service.populate(&scope, &CancellationFlag::new())?;
    render_population_report(&scope.label(), &report);

    if let Some(path) = output {
        let reviews = runtime
            .store
            .reviews()
            .map_err(ReviewServiceError::from)?;
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &reviews).map_err(io::Error::from)?;
        println!("Wrote {} review records to {}", reviews.len(), path.display());
    }

    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let runtime = ReviewRuntime::from_config(&config.reviews)?;

    if let Some(path) = &args.reviews {
        let reviews: Vec<CompetencyReview> =
            serde_json::from_reader(File::open(path)?).map_err(SeedError::from)?;
        let loaded = runtime
            .store
            .insert_reviews(reviews)
            .map_err(ReviewServiceError::from)?;
        println!("Loaded {loaded} review records from {}", path.display());
    }

    let period = match args.period {
        Some(id) => ReviewPeriodId(id),
        None => match runtime
            .organisation
            .current_period()
            .map_err(ReviewServiceError::from)?
        {
            Some(period) => period.id,
            None => {
                println!("No current review period; nothing to score.");
                return Ok(());
            }
        },
    };

    let employee = EmployeeId::new(args.employee);
    let outcome = runtime
        .service
        .calculate(&employee, period, args.leg.into())?;
    println!(
        "Scored {employee} for period {period}: {} profiles created, {} updated",
        outcome.created, outcome.updated
    );

    let report = runtime.service.gap_report(&employee, period)?;
    render_gap_report(&report);
    Ok(())
}

pub(crate) fn run_match(args: MatchArgs) {
    let outcome = score_partial_match(&args.left, &args.right);
    println!(
        "middle segment {:.1}% | last segment {:.1}% | {}",
        outcome.middle_score,
        outcome.last_score,
        if outcome.matched { "match" } else { "no match" }
    );
}

pub(crate) fn render_population_report(scope: &str, report: &PopulationReport) {
    let Some(period) = report.period else {
        println!("No current review period; nothing populated for {scope}.");
        return;
    };

    println!(
        "Populated {scope} for period {period}: {} employees, {} review records created",
        report.attempted, report.created
    );
    if report.cancelled {
        println!("Run cancelled before every employee was attempted.");
    }

    for outcome in &report.employees {
        if let Some(reason) = outcome.skipped {
            println!("- {}: skipped ({reason:?})", outcome.employee);
            continue;
        }
        let detail: Vec<String> = outcome
            .review_types
            .iter()
            .map(|type_outcome| match type_outcome.skipped {
                Some(reason) => format!("{} skipped ({reason:?})", type_outcome.review_type),
                None => format!("{} {}", type_outcome.review_type, type_outcome.created),
            })
            .collect();
        println!("- {}: {} [{}]", outcome.employee, outcome.created, detail.join(", "));
    }

    if !report.failures.is_empty() {
        println!("Failures");
        for failure in &report.failures {
            let review_type = failure
                .review_type
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "all types".to_string());
            println!(
                "- {} / {} during {}: {}",
                failure.employee, review_type, failure.operation, failure.message
            );
        }
    }
}

pub(crate) fn render_gap_report(report: &GapReport) {
    println!(
        "Gap report for {} (period {}): {} assessed, {} below expectation, total gap {:.1}",
        report.employee, report.period, report.assessed, report.with_gap, report.total_gap
    );
    for profile in &report.gaps {
        println!(
            "- {} ({}): expected {} ({}), achieved {} ({}), gap {:.1}",
            profile.competency_name,
            if profile.technical { "technical" } else { "behavioral" },
            profile.expected_rating_name,
            profile.expected_rating_value,
            profile.average_rating_name,
            profile.average_rating_value,
            profile.competency_gap
        );
    }
}
