//! Payout event consumer.
//!
//! Pulls payout-requested events from Kafka and drives a [`PayoutHandler`]
//! through a small per-message state machine: a handler failure schedules a
//! retry with backoff, and after the attempt budget is spent the raw message
//! goes to the dead-letter topic. Offsets are committed only after the
//! message reaches a terminal state, so a crash mid-flight redelivers.

use std::sync::Arc;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::sync::watch;

use settlement_types::{PayoutHandler, PayoutRequested};

/// Configuration for a [`PayoutConsumer`].
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
    pub dlq_topic: String,
    /// Handler attempts per message before dead-lettering.
    pub max_attempts: u32,
    /// Sleep between handler attempts.
    pub retry_backoff: Duration,
}

impl ConsumerConfig {
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            topic: crate::PAYOUT_TOPIC.to_string(),
            group_id: crate::PAYOUT_GROUP.to_string(),
            dlq_topic: crate::PAYOUT_DLQ_TOPIC.to_string(),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Per-message delivery state.
///
/// Kept separate from the Kafka plumbing so the retry policy can be tested
/// without a broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Received,
    Processing { attempt: u32 },
    Settled,
    RetryScheduled { attempt: u32 },
    DeadLettered,
}

impl Delivery {
    /// Moves into the next handler attempt.
    pub fn start(self) -> Delivery {
        match self {
            Delivery::Received => Delivery::Processing { attempt: 1 },
            Delivery::RetryScheduled { attempt } => Delivery::Processing {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// Applies the outcome of a handler attempt.
    pub fn complete(self, succeeded: bool, max_attempts: u32) -> Delivery {
        match self {
            Delivery::Processing { attempt } => {
                if succeeded {
                    Delivery::Settled
                } else if attempt >= max_attempts {
                    Delivery::DeadLettered
                } else {
                    Delivery::RetryScheduled { attempt }
                }
            }
            other => other,
        }
    }

    /// True once the message needs no further attempts.
    pub fn is_terminal(self) -> bool {
        matches!(self, Delivery::Settled | Delivery::DeadLettered)
    }
}

/// Kafka consumer that settles payout-requested events.
pub struct PayoutConsumer {
    consumer: StreamConsumer,
    dlq_producer: FutureProducer,
    handler: Arc<dyn PayoutHandler>,
    config: ConsumerConfig,
}

impl PayoutConsumer {
    pub fn new(config: ConsumerConfig, handler: Arc<dyn PayoutHandler>) -> Result<Self, KafkaError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;

        let dlq_producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            consumer,
            dlq_producer,
            handler,
            config,
        })
    }

    /// Consumes until the shutdown signal flips to `true`.
    ///
    /// Broker errors are logged and retried; only shutdown ends the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), KafkaError> {
        self.consumer.subscribe(&[&self.config.topic])?;
        tracing::info!(
            topic = %self.config.topic,
            group = %self.config.group_id,
            "payout consumer started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("payout consumer shutting down");
                        return Ok(());
                    }
                }
                msg = self.consumer.recv() => {
                    match msg {
                        Ok(msg) => self.process(&msg).await,
                        Err(e) => {
                            tracing::warn!(error = %e, "kafka receive error");
                            tokio::time::sleep(self.config.retry_backoff).await;
                        }
                    }
                }
            }
        }
    }

    async fn process(&self, msg: &BorrowedMessage<'_>) {
        let payload = msg.payload().unwrap_or_default();

        let event: PayoutRequested = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                // Malformed payloads can never succeed; dead-letter at once.
                tracing::error!(error = %e, "undecodable payout event, dead-lettering");
                self.dead_letter(msg.key(), payload).await;
                self.commit(msg);
                return;
            }
        };

        let mut state = Delivery::Received;
        while !state.is_terminal() {
            if let Delivery::RetryScheduled { attempt } = state {
                tracing::warn!(
                    order_id = %event.order_id,
                    attempt,
                    "payout handling failed, retrying"
                );
                tokio::time::sleep(self.config.retry_backoff).await;
            }
            state = state.start();

            let result = self.handler.handle(event.clone()).await;
            if let Err(e) = &result {
                tracing::warn!(order_id = %event.order_id, error = %e, "payout handler error");
            }
            state = state.complete(result.is_ok(), self.config.max_attempts);
        }

        match state {
            Delivery::Settled => {
                tracing::info!(order_id = %event.order_id, "payout event settled");
            }
            _ => {
                tracing::error!(
                    order_id = %event.order_id,
                    "payout event exhausted retries, dead-lettering"
                );
                self.dead_letter(msg.key(), payload).await;
            }
        }
        self.commit(msg);
    }

    async fn dead_letter(&self, key: Option<&[u8]>, payload: &[u8]) {
        let record = FutureRecord::to(&self.config.dlq_topic)
            .key(key.unwrap_or_default())
            .payload(payload);

        if let Err((e, _)) = self
            .dlq_producer
            .send(record, Duration::from_secs(5))
            .await
        {
            // Nothing left to do but log; the uncommitted offset redelivers.
            tracing::error!(
                topic = %self.config.dlq_topic,
                error = %e,
                "failed to dead-letter payout event"
            );
        }
    }

    fn commit(&self, msg: &BorrowedMessage<'_>) {
        if let Err(e) = self.consumer.commit_message(msg, CommitMode::Async) {
            tracing::warn!(error = %e, "failed to commit offset");
        }
    }
}
