//! Payment gateway port.
//!
//! This trait defines the interface to the external payment provider's
//! initiate/verify endpoints. The HTTP adapter lives in `settlement-gateway`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Money, OrderId};

/// The gateway status string that marks a payment as completed. Every other
/// status is passed through verbatim.
pub const GATEWAY_STATUS_COMPLETED: &str = "Completed";

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed gateway response: {0}")]
    Decode(String),

    #[error("Gateway rejected request: {status} - {message}")]
    Rejected { status: u16, message: String },
}

/// Result of initiating a payment with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInitiation {
    /// Gateway-issued transaction identifier.
    pub txn_id: String,
    /// URL the customer completes the payment at.
    pub payment_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in: Option<i64>,
}

/// Result of looking up a payment with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayLookup {
    pub txn_id: String,
    /// Amount in the gateway's minor unit.
    pub total_amount: i64,
    /// Gateway status string, verbatim.
    pub status: String,
    pub transaction_id: Option<String>,
    pub fee: i64,
    pub refunded: bool,
}

impl GatewayLookup {
    pub fn is_completed(&self) -> bool {
        self.status == GATEWAY_STATUS_COMPLETED
    }
}

/// Port trait for the external payment gateway.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Initiates a payment; the amount is sent in the gateway's minor unit.
    /// No retry is attempted here - callers retry the whole operation.
    async fn initiate(
        &self,
        order_id: OrderId,
        amount: Money,
        order_name: &str,
    ) -> Result<GatewayInitiation, GatewayError>;

    /// Looks up the current state of a payment by its transaction id.
    async fn verify(&self, txn_id: &str) -> Result<GatewayLookup, GatewayError>;
}
