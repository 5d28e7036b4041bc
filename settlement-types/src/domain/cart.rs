//! Cart aggregate as supplied by the external cart store.
//!
//! These types are read-only inside the settlement core: the cart service
//! owns them and has already computed every financial total before checkout
//! ever sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::define_id;
use super::money::Money;
use super::VendorId;
use crate::error::DomainError;

define_id!(
    /// Unique identifier for a cart session.
    SessionId
);
define_id!(
    /// Unique identifier for a per-vendor cart grouping.
    CartVendorId
);
define_id!(
    /// Unique identifier for a cart line item.
    CartItemId
);

/// A per-vendor grouping of a user's cart with pre-computed financial totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartVendor {
    pub id: CartVendorId,
    pub session_id: SessionId,
    pub vendor_id: VendorId,
    pub subtotal: Money,
    pub delivery_charge: Money,
    pub vendor_service_charge: Money,
    pub vat: Money,
    pub discount: Money,
    pub created_at: DateTime<Utc>,
}

/// One line item of a cart-vendor grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_vendor_id: CartVendorId,
    pub item_id: super::MenuItemId,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// Line subtotal: quantity x unit price, minus the line discount.
    pub fn subtotal(&self) -> Result<Money, DomainError> {
        self.unit_price
            .checked_mul(self.quantity)?
            .checked_sub(self.discount)
    }
}
