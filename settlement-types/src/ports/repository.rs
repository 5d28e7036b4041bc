//! Storage port traits.
//!
//! These are the primary ports in our hexagonal architecture. The SQLite
//! adapter implements all of them on one connection pool.

use chrono::{DateTime, Utc};

use crate::domain::{
    OrderId, OrderItem, OrderPayment, OrderVendor, PaymentAttemptStatus, Payout,
};
use crate::error::RepoError;

/// Order persistence.
///
/// `create_order` MUST be atomic: either the order-vendor row and every item
/// row land together, or nothing is visible.
#[async_trait::async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Persists an order and its items in one transaction.
    ///
    /// A second checkout of the same cart-vendor fails with `Conflict`.
    async fn create_order(
        &self,
        order: &OrderVendor,
        items: &[OrderItem],
    ) -> Result<(), RepoError>;

    /// Gets an order by ID.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderVendor>, RepoError>;

    /// Lists the items of an order.
    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepoError>;
}

/// Payment attempt persistence with idempotency guarantees.
#[async_trait::async_trait]
pub trait PaymentLedger: Send + Sync + 'static {
    /// Records a new payment attempt (status `initiated`).
    async fn insert_attempt(&self, payment: &OrderPayment) -> Result<(), RepoError>;

    /// Finds the successful payment for an order, if any. At most one row per
    /// order may ever reach `success`.
    async fn find_success_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderPayment>, RepoError>;

    /// Finds a payment attempt by its gateway transaction id.
    async fn find_by_txn(&self, txn_id: &str) -> Result<Option<OrderPayment>, RepoError>;

    /// Marks a payment successful AND its order paid, in one transaction.
    ///
    /// Safe to re-run for an already-successful payment. Returns the updated
    /// payment row.
    async fn record_success(
        &self,
        txn_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<OrderPayment, RepoError>;

    /// Persists a non-success gateway status verbatim; the order row is left
    /// untouched.
    async fn record_status(
        &self,
        txn_id: &str,
        status: &PaymentAttemptStatus,
    ) -> Result<(), RepoError>;
}

/// Payout settlement record persistence.
#[async_trait::async_trait]
pub trait PayoutRepository: Send + Sync + 'static {
    /// Inserts a payout settlement record.
    async fn insert_payout(&self, payout: &Payout) -> Result<(), RepoError>;

    /// Finds the payout for an order, if it was already settled.
    async fn find_payout_for_order(&self, order_id: OrderId)
        -> Result<Option<Payout>, RepoError>;
}
