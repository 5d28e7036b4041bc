//! Payout event bus ports.

use crate::domain::PayoutRequested;
use crate::error::AppError;

/// Error type for event publication.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to serialize event: {0}")]
    Serialize(String),

    #[error("Broker error: {0}")]
    Broker(String),
}

/// Port trait for publishing payout-requested events.
///
/// `publish` returns once the broker has acknowledged the write; it never
/// waits for consumer processing. Delivery downstream is at-least-once.
#[async_trait::async_trait]
pub trait PayoutEventBus: Send + Sync + 'static {
    async fn publish(&self, event: &PayoutRequested) -> Result<(), PublishError>;
}

/// Port trait for the consumer side: whatever settles a payout request.
#[async_trait::async_trait]
pub trait PayoutHandler: Send + Sync + 'static {
    /// Handles one payout-requested event. Must be idempotent per order:
    /// at-least-once delivery means the same event can arrive twice.
    async fn handle(&self, event: PayoutRequested) -> Result<(), AppError>;
}
