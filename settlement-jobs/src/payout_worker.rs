//! The payout worker job.
//!
//! Runs the Kafka payout consumer until interrupted, settling each
//! payout-requested event into a durable payout record.

use std::sync::Arc;

use tokio::sync::watch;

use settlement_core::PayoutService;
use settlement_events::{ConsumerConfig, PayoutConsumer};

use crate::{Job, JobContext};

pub struct PayoutWorkerJob;

#[async_trait::async_trait]
impl Job for PayoutWorkerJob {
    fn name(&self) -> &'static str {
        "payout-worker"
    }

    fn description(&self) -> &'static str {
        "Consumes payout-requested events and settles vendor payouts"
    }

    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let service = Arc::new(PayoutService::new(ctx.repo()));
        let config = ConsumerConfig::new(ctx.config().kafka_brokers.clone());
        let consumer = PayoutConsumer::new(config, service)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(true);
            }
        });

        consumer.run(shutdown_rx).await?;
        Ok(())
    }
}
