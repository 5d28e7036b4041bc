//! Port traits of the settlement core.
//!
//! Adapters (SQLite, the payment gateway HTTP client, Kafka) implement these.

mod cart_store;
mod event_bus;
mod gateway;
mod repository;

pub use cart_store::{CartStore, VendorDirectory};
pub use event_bus::{PayoutEventBus, PayoutHandler, PublishError};
pub use gateway::{GatewayError, GatewayInitiation, GatewayLookup, PaymentGateway, GATEWAY_STATUS_COMPLETED};
pub use repository::{OrderRepository, PaymentLedger, PayoutRepository};

/// An adapter that implements every storage port on one backend.
///
/// Services and the HTTP server are generic over this, so one pool (or one
/// in-memory mock) can back the whole settlement flow.
pub trait SettlementStore:
    CartStore + VendorDirectory + OrderRepository + PaymentLedger + PayoutRepository
{
}

impl<T> SettlementStore for T where
    T: CartStore + VendorDirectory + OrderRepository + PaymentLedger + PayoutRepository
{
}
