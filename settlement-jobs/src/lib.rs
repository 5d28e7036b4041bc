//! # Settlement Jobs
//!
//! Background job framework for the settlement core.
//!
//! Jobs are an explicit, closed set: `JobKind` enumerates them and maps each
//! to its constructor, so two jobs can never share a name and an unknown job
//! name fails at CLI parse time. `JobContext` builds the shared dependencies
//! once per run and `JobRunner` guarantees they are torn down on every exit
//! path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use settlement_events::KafkaPayoutBus;
use settlement_repo::SqliteRepo;

pub mod payout_worker;

pub use payout_worker::PayoutWorkerJob;

/// A runnable background job.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()>;
}

/// The closed set of jobs this binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    PayoutWorker,
}

impl JobKind {
    /// Every job, in the order `list` prints them.
    pub fn all() -> &'static [JobKind] {
        &[JobKind::PayoutWorker]
    }

    /// Maps the kind to its job instance.
    pub fn build(self) -> Box<dyn Job> {
        match self {
            JobKind::PayoutWorker => Box::new(PayoutWorkerJob),
        }
    }
}

/// Environment-derived configuration shared by all jobs.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub database_url: String,
    pub kafka_brokers: String,
}

impl JobConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let kafka_brokers =
            std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());

        Ok(Self {
            database_url,
            kafka_brokers,
        })
    }
}

/// Shared dependencies for one job run.
///
/// Built once before the job starts; `close()` is idempotent, so the runner
/// can call it unconditionally.
pub struct JobContext {
    repo: Arc<SqliteRepo>,
    bus: Arc<KafkaPayoutBus>,
    config: JobConfig,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl JobContext {
    pub async fn build(config: JobConfig) -> anyhow::Result<Self> {
        let repo = Arc::new(settlement_repo::build_repo(&config.database_url).await?);
        let bus = Arc::new(KafkaPayoutBus::new(&config.kafka_brokers)?);

        Ok(Self {
            repo,
            bus,
            config,
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
        })
    }

    pub fn repo(&self) -> Arc<SqliteRepo> {
        self.repo.clone()
    }

    pub fn bus(&self) -> Arc<KafkaPayoutBus> {
        self.bus.clone()
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Tears the shared dependencies down. Safe to call more than once; only
    /// the first call does anything.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.repo.pool().close().await;
        tracing::info!("job context closed");
    }

    /// How many times the context has actually been torn down.
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

/// Runs jobs with start/success/failure tracing and guaranteed teardown.
pub struct JobRunner;

impl JobRunner {
    /// Builds a context from config and runs the given job to completion.
    pub async fn run(kind: JobKind, config: JobConfig) -> anyhow::Result<()> {
        let ctx = JobContext::build(config).await?;
        Self::run_with(kind.build().as_ref(), &ctx).await
    }

    /// Runs one job against an existing context. The context is closed on
    /// every exit path, success or failure.
    pub async fn run_with(job: &dyn Job, ctx: &JobContext) -> anyhow::Result<()> {
        tracing::info!(job = job.name(), "job starting");

        let result = job.run(ctx).await;
        ctx.close().await;

        match &result {
            Ok(()) => tracing::info!(job = job.name(), "job finished"),
            Err(e) => tracing::error!(job = job.name(), error = %e, "job failed"),
        }
        result
    }
}
