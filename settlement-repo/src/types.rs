//! Database row structs and domain conversions.
//!
//! SQLite stores UUIDs as strings and timestamps as RFC3339 text; every row
//! struct owns the parsing back into domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use settlement_types::{
    AddressId, CartItem, CartItemId, CartVendor, CartVendorId, Currency, MenuItemId, Money,
    OrderId, OrderItem, OrderItemId, OrderPayment, OrderStatus, OrderVendor,
    PaymentAttemptStatus, PaymentId, PaymentStatus, Payout, PayoutId, PayoutStatus, RepoError,
    SessionId, UserId, VendorId, VendorPayoutProfile,
};

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_uuid(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(|e| RepoError::Database(e.to_string()))
}

pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Database(e.to_string()))
}

pub fn parse_currency(s: &str) -> Result<Currency, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown currency: {}", s)))
}

fn parse_money(amount: i64, currency: &str) -> Result<Money, RepoError> {
    Money::new(amount, parse_currency(currency)?).map_err(RepoError::Domain)
}

fn parse_order_status(s: &str) -> Result<OrderStatus, RepoError> {
    match s {
        "placed" => Ok(OrderStatus::Placed),
        "confirmed" => Ok(OrderStatus::Confirmed),
        "dispatched" => Ok(OrderStatus::Dispatched),
        "delivered" => Ok(OrderStatus::Delivered),
        "cancelled" => Ok(OrderStatus::Cancelled),
        other => Err(RepoError::Database(format!("Unknown order status: {}", other))),
    }
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, RepoError> {
    match s {
        "unpaid" => Ok(PaymentStatus::Unpaid),
        "paid" => Ok(PaymentStatus::Paid),
        other => Err(RepoError::Database(format!(
            "Unknown payment status: {}",
            other
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cart rows (read-only)
// ─────────────────────────────────────────────────────────────────────────────

/// Cart-vendor row from database.
#[derive(FromRow)]
pub struct DbCartVendor {
    pub id: String,
    pub session_id: String,
    pub vendor_id: String,
    pub subtotal: i64,
    pub delivery_charge: i64,
    pub vendor_service_charge: i64,
    pub vat: i64,
    pub discount: i64,
    pub currency: String,
    pub created_at: String,
}

impl DbCartVendor {
    pub fn into_domain(self) -> Result<CartVendor, RepoError> {
        Ok(CartVendor {
            id: CartVendorId::from_uuid(parse_uuid(&self.id)?),
            session_id: SessionId::from_uuid(parse_uuid(&self.session_id)?),
            vendor_id: VendorId::from_uuid(parse_uuid(&self.vendor_id)?),
            subtotal: parse_money(self.subtotal, &self.currency)?,
            delivery_charge: parse_money(self.delivery_charge, &self.currency)?,
            vendor_service_charge: parse_money(self.vendor_service_charge, &self.currency)?,
            vat: parse_money(self.vat, &self.currency)?,
            discount: parse_money(self.discount, &self.currency)?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Cart item row from database.
#[derive(FromRow)]
pub struct DbCartItem {
    pub id: String,
    pub cart_vendor_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub discount: i64,
    pub instructions: Option<String>,
    pub created_at: String,
}

impl DbCartItem {
    pub fn into_domain(self, currency: Currency) -> Result<CartItem, RepoError> {
        Ok(CartItem {
            id: CartItemId::from_uuid(parse_uuid(&self.id)?),
            cart_vendor_id: CartVendorId::from_uuid(parse_uuid(&self.cart_vendor_id)?),
            item_id: MenuItemId::from_uuid(parse_uuid(&self.item_id)?),
            quantity: self.quantity,
            unit_price: Money::new(self.unit_price, currency).map_err(RepoError::Domain)?,
            discount: Money::new(self.discount, currency).map_err(RepoError::Domain)?,
            instructions: self.instructions,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Order rows
// ─────────────────────────────────────────────────────────────────────────────

/// Order-vendor row from database.
#[derive(FromRow)]
pub struct DbOrderVendor {
    pub id: String,
    pub cart_vendor_id: String,
    pub session_id: String,
    pub user_id: String,
    pub vendor_id: String,
    pub delivery_address_id: String,
    pub instructions: Option<String>,
    pub expected_delivery_time: String,
    pub subtotal: i64,
    pub delivery_charge: i64,
    pub vendor_service_charge: i64,
    pub vat: i64,
    pub discount: i64,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub created_at: String,
}

impl DbOrderVendor {
    pub fn into_domain(self) -> Result<OrderVendor, RepoError> {
        Ok(OrderVendor {
            id: OrderId::from_uuid(parse_uuid(&self.id)?),
            cart_vendor_id: CartVendorId::from_uuid(parse_uuid(&self.cart_vendor_id)?),
            session_id: SessionId::from_uuid(parse_uuid(&self.session_id)?),
            user_id: UserId::from_uuid(parse_uuid(&self.user_id)?),
            vendor_id: VendorId::from_uuid(parse_uuid(&self.vendor_id)?),
            delivery_address_id: AddressId::from_uuid(parse_uuid(&self.delivery_address_id)?),
            instructions: self.instructions,
            expected_delivery_time: parse_datetime(&self.expected_delivery_time)?,
            subtotal: parse_money(self.subtotal, &self.currency)?,
            delivery_charge: parse_money(self.delivery_charge, &self.currency)?,
            vendor_service_charge: parse_money(self.vendor_service_charge, &self.currency)?,
            vat: parse_money(self.vat, &self.currency)?,
            discount: parse_money(self.discount, &self.currency)?,
            status: parse_order_status(&self.status)?,
            payment_status: parse_payment_status(&self.payment_status)?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Order item row from database.
#[derive(FromRow)]
pub struct DbOrderItem {
    pub id: String,
    pub order_vendor_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub discount: i64,
    pub subtotal: i64,
    pub instructions: Option<String>,
    pub created_at: String,
}

impl DbOrderItem {
    pub fn into_domain(self, currency: Currency) -> Result<OrderItem, RepoError> {
        Ok(OrderItem {
            id: OrderItemId::from_uuid(parse_uuid(&self.id)?),
            order_id: OrderId::from_uuid(parse_uuid(&self.order_vendor_id)?),
            item_id: MenuItemId::from_uuid(parse_uuid(&self.item_id)?),
            quantity: self.quantity,
            unit_price: Money::new(self.unit_price, currency).map_err(RepoError::Domain)?,
            discount: Money::new(self.discount, currency).map_err(RepoError::Domain)?,
            subtotal: Money::new(self.subtotal, currency).map_err(RepoError::Domain)?,
            instructions: self.instructions,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Payment attempt row from database.
#[derive(FromRow)]
pub struct DbOrderPayment {
    pub id: String,
    pub order_vendor_id: String,
    pub txn_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub paid_at: Option<String>,
    pub created_at: String,
}

impl DbOrderPayment {
    pub fn into_domain(self) -> Result<OrderPayment, RepoError> {
        Ok(OrderPayment {
            id: PaymentId::from_uuid(parse_uuid(&self.id)?),
            order_id: OrderId::from_uuid(parse_uuid(&self.order_vendor_id)?),
            txn_id: self.txn_id,
            amount: parse_money(self.amount, &self.currency)?,
            status: PaymentAttemptStatus::parse(&self.status),
            paid_at: self.paid_at.as_deref().map(parse_datetime).transpose()?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Payout row from database.
#[derive(FromRow)]
pub struct DbPayout {
    pub id: String,
    pub order_vendor_id: String,
    pub vendor_user_id: String,
    pub payout_account_id: String,
    pub connected_account_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub transfer_ref: String,
    pub created_at: String,
}

impl DbPayout {
    pub fn into_domain(self) -> Result<Payout, RepoError> {
        let status = match self.status.as_str() {
            "completed" => PayoutStatus::Completed,
            "failed" => PayoutStatus::Failed,
            other => {
                return Err(RepoError::Database(format!(
                    "Unknown payout status: {}",
                    other
                )));
            }
        };

        Ok(Payout {
            id: PayoutId::from_uuid(parse_uuid(&self.id)?),
            order_id: OrderId::from_uuid(parse_uuid(&self.order_vendor_id)?),
            vendor_user_id: UserId::from_uuid(parse_uuid(&self.vendor_user_id)?),
            payout_account_id: self.payout_account_id,
            connected_account_id: self.connected_account_id,
            amount: parse_money(self.amount, &self.currency)?,
            status,
            transfer_ref: self.transfer_ref,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Vendor payout account row from database.
#[derive(FromRow)]
pub struct DbVendorAccount {
    pub vendor_id: String,
    pub vendor_user_id: String,
    pub connected_account_id: String,
    pub payout_account_id: String,
}

impl DbVendorAccount {
    pub fn into_domain(self) -> Result<VendorPayoutProfile, RepoError> {
        Ok(VendorPayoutProfile {
            vendor_id: VendorId::from_uuid(parse_uuid(&self.vendor_id)?),
            vendor_user_id: UserId::from_uuid(parse_uuid(&self.vendor_user_id)?),
            connected_account_id: self.connected_account_id,
            payout_account_id: self.payout_account_id,
        })
    }
}

/// Currency-only row for queries.
#[derive(FromRow)]
pub struct DbCurrency {
    pub currency: String,
}
