//! # Settlement Types
//!
//! Domain types and port traits for the order-settlement core.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, CartVendor, OrderVendor, OrderPayment, Payout)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AddressId, CartItem, CartItemId, CartVendor, CartVendorId, Currency, MenuItemId, Money,
    OrderId, OrderItem, OrderItemId, OrderPayment, OrderStatus, OrderVendor, PaymentAttemptStatus, PaymentId,
    PaymentStatus, Payout, PayoutId, PayoutRequested, PayoutStatus, SessionId, UserId,
    VendorId, VendorPayoutProfile,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::{
    CartStore, GatewayError, GatewayInitiation, GatewayLookup, OrderRepository, PaymentGateway,
    PaymentLedger, PayoutEventBus, PayoutHandler, PayoutRepository, PublishError,
    SettlementStore, VendorDirectory, GATEWAY_STATUS_COMPLETED,
};
