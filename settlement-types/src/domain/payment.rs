//! Payment attempt ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::define_id;
use super::money::Money;
use super::order::OrderId;

define_id!(
    /// Unique identifier for a payment attempt row.
    PaymentId
);

/// Status of a payment attempt.
///
/// Gateway statuses that are not part of the well-known set are carried
/// verbatim (`Other`), never normalized - the ledger is a faithful record of
/// what the gateway said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentAttemptStatus {
    Initiated,
    Success,
    Failed,
    Refunded,
    #[serde(untagged)]
    Other(String),
}

impl PaymentAttemptStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentAttemptStatus::Initiated => "initiated",
            PaymentAttemptStatus::Success => "success",
            PaymentAttemptStatus::Failed => "failed",
            PaymentAttemptStatus::Refunded => "refunded",
            PaymentAttemptStatus::Other(s) => s,
        }
    }

    /// Parses a stored status string; unknown values round-trip verbatim.
    pub fn parse(s: &str) -> Self {
        match s {
            "initiated" => PaymentAttemptStatus::Initiated,
            "success" => PaymentAttemptStatus::Success,
            "failed" => PaymentAttemptStatus::Failed,
            "refunded" => PaymentAttemptStatus::Refunded,
            other => PaymentAttemptStatus::Other(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentAttemptStatus::Success)
    }
}

impl std::fmt::Display for PaymentAttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One payment attempt for an order, keyed by the gateway-issued transaction
/// id. `paid_at` is set only on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayment {
    pub id: PaymentId,
    pub order_id: OrderId,
    /// Gateway-issued transaction identifier (`pidx`).
    pub txn_id: String,
    pub amount: Money,
    pub status: PaymentAttemptStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OrderPayment {
    /// Creates the durable "we started this" record for a new gateway attempt.
    pub fn initiated(order_id: OrderId, txn_id: String, amount: Money) -> Self {
        Self {
            id: PaymentId::new(),
            order_id,
            txn_id,
            amount,
            status: PaymentAttemptStatus::Initiated,
            paid_at: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_verbatim() {
        let status = PaymentAttemptStatus::parse("Pending");
        assert_eq!(status, PaymentAttemptStatus::Other("Pending".into()));
        assert_eq!(status.as_str(), "Pending");
    }

    #[test]
    fn test_known_statuses_parse() {
        assert!(PaymentAttemptStatus::parse("success").is_success());
        assert_eq!(
            PaymentAttemptStatus::parse("refunded"),
            PaymentAttemptStatus::Refunded
        );
    }
}
