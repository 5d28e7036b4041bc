//! Order domain model.
//!
//! An `OrderVendor` is the settlement unit created from one cart-vendor at
//! checkout. Its financial fields are *frozen* copies of the cart totals:
//! once created, later menu-price or cart changes never retroactively affect
//! the order (pricing snapshot).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::{CartItem, CartVendor, CartVendorId, SessionId};
use super::define_id;
use super::money::Money;
use super::{UserId, VendorId};
use crate::error::DomainError;

define_id!(
    /// Unique identifier for an order-vendor (the order a client sees).
    OrderId
);
define_id!(
    /// Unique identifier for an order line item.
    OrderItemId
);
define_id!(
    /// Unique identifier for a menu item, owned by the catalog service.
    MenuItemId
);
define_id!(
    /// Unique identifier for a delivery address, owned by the profile service.
    AddressId
);

/// Fulfillment state of an order. Settlement only ever creates orders in
/// `Placed`; the remaining transitions belong to the fulfillment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Confirmed,
    Dispatched,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Payment state of an order. Transitions `Unpaid -> Paid` exactly once,
/// driven by a verified payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// The settlement unit created from one cart-vendor at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderVendor {
    pub id: OrderId,
    pub cart_vendor_id: CartVendorId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub vendor_id: VendorId,
    pub delivery_address_id: AddressId,
    pub instructions: Option<String>,
    pub expected_delivery_time: DateTime<Utc>,
    // Frozen financial snapshot, copied verbatim from the cart-vendor.
    pub subtotal: Money,
    pub delivery_charge: Money,
    pub vendor_service_charge: Money,
    pub vat: Money,
    pub discount: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderVendor {
    /// Freezes a cart-vendor's totals into a new order.
    pub fn from_cart(
        cart: &CartVendor,
        user_id: UserId,
        delivery_address_id: AddressId,
        instructions: Option<String>,
        expected_delivery_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            cart_vendor_id: cart.id,
            session_id: cart.session_id,
            user_id,
            vendor_id: cart.vendor_id,
            delivery_address_id,
            instructions,
            expected_delivery_time,
            subtotal: cart.subtotal,
            delivery_charge: cart.delivery_charge,
            vendor_service_charge: cart.vendor_service_charge,
            vat: cart.vat,
            discount: cart.discount,
            status: OrderStatus::Placed,
            payment_status: PaymentStatus::Unpaid,
            created_at: Utc::now(),
        }
    }

    /// The amount the customer is charged for this order.
    pub fn grand_total(&self) -> Result<Money, DomainError> {
        self.subtotal
            .checked_add(self.delivery_charge)?
            .checked_add(self.vendor_service_charge)?
            .checked_add(self.vat)?
            .checked_sub(self.discount)
    }
}

/// One row per cart item, copied verbatim at checkout time; immutable after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub item_id: MenuItemId,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub subtotal: Money,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Copies a cart item into an order line, computing its frozen subtotal.
    pub fn from_cart_item(order_id: OrderId, item: &CartItem) -> Result<Self, DomainError> {
        Ok(Self {
            id: OrderItemId::new(),
            order_id,
            item_id: item.item_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            discount: item.discount,
            subtotal: item.subtotal()?,
            instructions: item.instructions.clone(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    fn npr(amount: i64) -> Money {
        Money::new(amount, Currency::NPR).unwrap()
    }

    fn cart() -> CartVendor {
        CartVendor {
            id: CartVendorId::new(),
            session_id: SessionId::new(),
            vendor_id: VendorId::new(),
            subtotal: npr(100000),
            delivery_charge: npr(10000),
            vendor_service_charge: npr(2000),
            vat: npr(1500),
            discount: npr(0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_freezes_cart_totals() {
        let cart = cart();
        let order = OrderVendor::from_cart(
            &cart,
            UserId::new(),
            AddressId::new(),
            Some("ring the bell".into()),
            Utc::now(),
        );

        assert_eq!(order.cart_vendor_id, cart.id);
        assert_eq!(order.subtotal, cart.subtotal);
        assert_eq!(order.delivery_charge, cart.delivery_charge);
        assert_eq!(order.vendor_service_charge, cart.vendor_service_charge);
        assert_eq!(order.vat, cart.vat);
        assert_eq!(order.discount, cart.discount);
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_grand_total() {
        let cart = cart();
        let order =
            OrderVendor::from_cart(&cart, UserId::new(), AddressId::new(), None, Utc::now());
        assert_eq!(order.grand_total().unwrap().minor_units(), 113500);
    }
}
