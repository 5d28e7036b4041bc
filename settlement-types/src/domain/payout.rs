//! Vendor payout: the event that requests one and the record that settles it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::SessionId;
use super::define_id;
use super::money::Money;
use super::order::OrderId;
use super::{UserId, VendorId};

define_id!(
    /// Unique identifier for a payout record.
    PayoutId
);

/// Immutable message payload produced once per settled order.
///
/// Field names are the wire contract of the payout topic - do not rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRequested {
    pub session_id: SessionId,
    pub order_id: OrderId,
    pub vendor_user_id: UserId,
    /// Connected account at the payout provider.
    #[serde(rename = "stripe_acc_id")]
    pub connected_account_id: String,
    /// Destination account the funds land in.
    #[serde(rename = "payout_acc_id")]
    pub payout_account_id: String,
    /// Amount in minor currency units.
    pub amount: i64,
}

/// Payout account details for a vendor, owned by the vendor service and
/// read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorPayoutProfile {
    pub vendor_id: VendorId,
    pub vendor_user_id: UserId,
    pub connected_account_id: String,
    pub payout_account_id: String,
}

/// Outcome of a payout transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        }
    }
}

/// Settlement record written by the payout worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub order_id: OrderId,
    pub vendor_user_id: UserId,
    pub payout_account_id: String,
    pub connected_account_id: String,
    pub amount: Money,
    pub status: PayoutStatus,
    /// Provider-side reference for reconciliation.
    pub transfer_ref: String,
    pub created_at: DateTime<Utc>,
}
