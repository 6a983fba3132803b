use crate::commands::{run_match, run_populate, run_score, MatchArgs, PopulateArgs, ScoreArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use review_agent::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Review Agent",
    about = "Populate 360-degree competency reviews and score them from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Create review records for the current period from the configured seed data
    Populate(PopulateArgs),
    /// Aggregate recorded ratings into competency profiles and print the gap report
    Score(ScoreArgs),
    /// Compare two dot-delimited job-role descriptors
    Match(MatchArgs),
    /// Walk through counterpart selection, population, and scoring on a sample organisation
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Populate(args) => run_populate(args),
        Command::Score(args) => run_score(args),
        Command::Match(args) => {
            run_match(args);
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
    }
}
