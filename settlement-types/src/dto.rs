//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AddressId, CartVendorId, Currency, OrderId, OrderItem, OrderVendor, UserId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Checkout DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to convert a priced cart-vendor into a durable order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub cart_vendor_id: CartVendorId,
    pub delivery_address_id: AddressId,
    /// Optional delivery instructions for the whole order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub expected_delivery_time: DateTime<Utc>,
}

/// Response after a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
}

/// An order with its line items, as returned by the read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: OrderVendor,
    pub items: Vec<OrderItem>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to initiate a payment for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentRequest {
    pub order_id: OrderId,
    /// Amount to charge in minor currency units
    pub amount: i64,
    #[serde(default)]
    pub currency: Currency,
    /// Human-readable order name shown on the gateway's payment page
    pub order_name: String,
}

/// Response after a payment has been initiated with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentResponse {
    /// URL the customer is redirected to for completing the payment
    pub payment_url: String,
    /// Gateway-issued transaction identifier
    pub txn_id: String,
}

/// Request to verify a payment with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub txn_id: String,
}

/// Response after verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub order_id: OrderId,
    /// The gateway's status string, verbatim
    pub gateway_status: String,
    /// Whether the order is now settled as paid
    pub paid: bool,
}
