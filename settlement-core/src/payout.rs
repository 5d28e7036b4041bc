//! Payout Application Service
//!
//! Consumer-side settlement of payout-requested events. Idempotent per
//! order: at-least-once delivery means the same event can arrive twice.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use settlement_types::{
    AppError, Currency, Money, Payout, PayoutHandler, PayoutId, PayoutRepository,
    PayoutRequested, PayoutStatus, RepoError,
};

/// Settles payout-requested events into durable payout records.
pub struct PayoutService<R: PayoutRepository> {
    repo: Arc<R>,
}

impl<R: PayoutRepository> PayoutService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Settles one payout request.
    ///
    /// An order that already has a payout row is skipped as settled. The
    /// transfer reference is generated here and stored for reconciliation.
    pub async fn settle(&self, event: PayoutRequested) -> Result<(), AppError> {
        if let Some(existing) = self.repo.find_payout_for_order(event.order_id).await? {
            tracing::info!(
                order_id = %event.order_id,
                payout_id = %existing.id,
                "payout already settled, skipping"
            );
            return Ok(());
        }

        let payout = Payout {
            id: PayoutId::new(),
            order_id: event.order_id,
            vendor_user_id: event.vendor_user_id,
            payout_account_id: event.payout_account_id,
            connected_account_id: event.connected_account_id,
            amount: Money::new(event.amount, Currency::default())?,
            status: PayoutStatus::Completed,
            transfer_ref: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };

        match self.repo.insert_payout(&payout).await {
            Ok(()) => {
                tracing::info!(
                    order_id = %payout.order_id,
                    payout_id = %payout.id,
                    amount = payout.amount.minor_units(),
                    "payout settled"
                );
                Ok(())
            }
            // A concurrent worker settled the same order first.
            Err(RepoError::Conflict(_)) => {
                tracing::info!(order_id = %payout.order_id, "payout settled concurrently");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl<R: PayoutRepository> PayoutHandler for PayoutService<R> {
    async fn handle(&self, event: PayoutRequested) -> Result<(), AppError> {
        self.settle(event).await
    }
}
