//! # Settlement Events
//!
//! Kafka adapter for the payout pipeline. The producer side implements the
//! `PayoutEventBus` port; the consumer side drives a `PayoutHandler` with
//! bounded retries and a dead-letter topic.
//!
//! The producer is plain injected state: construct one `KafkaPayoutBus` at
//! startup and hand clones of an `Arc` to whoever publishes.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};

use settlement_types::{PayoutEventBus, PayoutRequested, PublishError};

pub mod consumer;

pub use consumer::{ConsumerConfig, PayoutConsumer};

/// Topic carrying payout-requested events, keyed by order id.
pub const PAYOUT_TOPIC: &str = "payout.requested";

/// Consumer group shared by all payout workers.
pub const PAYOUT_GROUP: &str = "payout-workers";

/// Dead-letter topic for events that exhausted their retries.
pub const PAYOUT_DLQ_TOPIC: &str = "payout.requested.dlq";

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka-backed producer for payout-requested events.
pub struct KafkaPayoutBus {
    producer: FutureProducer,
    topic: String,
}

impl KafkaPayoutBus {
    /// Connects a producer to the given brokers, publishing to [`PAYOUT_TOPIC`].
    pub fn new(brokers: &str) -> Result<Self, PublishError> {
        Self::with_topic(brokers, PAYOUT_TOPIC)
    }

    /// Connects a producer publishing to an explicit topic.
    pub fn with_topic(brokers: &str, topic: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl PayoutEventBus for KafkaPayoutBus {
    async fn publish(&self, event: &PayoutRequested) -> Result<(), PublishError> {
        let key = event.order_id.to_string();
        let payload =
            serde_json::to_string(event).map_err(|e| PublishError::Serialize(e.to_string()))?;

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        match self.producer.send(record, SEND_TIMEOUT).await {
            Ok(_) => {
                tracing::info!(
                    topic = %self.topic,
                    order_id = %key,
                    "payout event published"
                );
                Ok(())
            }
            Err((e, _)) => {
                tracing::error!(
                    topic = %self.topic,
                    order_id = %key,
                    error = %e,
                    "failed to publish payout event"
                );
                Err(PublishError::Broker(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlement_types::{OrderId, SessionId, UserId};

    #[test]
    fn test_event_round_trips_through_wire_format() {
        let event = PayoutRequested {
            session_id: SessionId::new(),
            order_id: OrderId::new(),
            vendor_user_id: UserId::new(),
            connected_account_id: "acct_1FgemYLjoZ5eta".into(),
            payout_account_id: "ba_9OaFhnLjoZ5et2".into(),
            amount: 113_500,
        };

        let json = serde_json::to_string(&event).unwrap();
        let decoded: PayoutRequested = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_producer_builds_without_broker() {
        // rdkafka connects lazily, so construction succeeds offline.
        assert!(KafkaPayoutBus::new("localhost:9092").is_ok());
    }
}
