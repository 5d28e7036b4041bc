//! # Settlement Core
//!
//! Application service layer and HTTP adapter for the order-settlement core.
//!
//! ## Architecture
//!
//! - `checkout` - converts priced carts into durable orders
//! - `payment` - gateway initiation and verification against the ledger
//! - `payout` - consumer-side settlement of payout-requested events
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Services are generic over the port traits in `settlement-types`, so the
//! SQLite adapter and the in-memory test mocks are interchangeable.

pub mod checkout;
pub mod inbound;
pub mod payment;
pub mod payout;

#[cfg(test)]
mod service_tests;

pub use checkout::CheckoutService;
pub use payment::PaymentService;
pub use payout::PayoutService;
