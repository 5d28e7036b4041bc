//! Settlement Jobs CLI
//!
//! `settlement-jobs list` enumerates the available jobs;
//! `settlement-jobs payout-worker` runs the payout worker until interrupted.
//! The process exits non-zero when a job fails.

use clap::{Parser, Subcommand};

use settlement_jobs::{JobConfig, JobKind, JobRunner};

#[derive(Parser)]
#[command(name = "settlement-jobs")]
#[command(author, version, about = "Background jobs for the settlement core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available jobs
    List,
    /// Consume payout-requested events and settle vendor payouts
    PayoutWorker,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,settlement_jobs=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            for kind in JobKind::all() {
                let job = kind.build();
                println!("{:<16} {}", job.name(), job.description());
            }
            Ok(())
        }
        Commands::PayoutWorker => {
            JobRunner::run(JobKind::PayoutWorker, JobConfig::from_env()?).await
        }
    }
}
