//! Pure domain types for the order-settlement core.

mod cart;
mod money;
mod order;
mod payment;
mod payout;

pub use cart::{CartItem, CartItemId, CartVendor, CartVendorId, SessionId};
pub use money::{Currency, Money};
pub use order::{AddressId, MenuItemId, OrderId, OrderItem, OrderItemId, OrderStatus, OrderVendor, PaymentStatus};
pub use payment::{OrderPayment, PaymentAttemptStatus, PaymentId};
pub use payout::{Payout, PayoutId, PayoutRequested, PayoutStatus, VendorPayoutProfile};

/// Generates a UUID-backed newtype identifier with the usual conversions.
macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

pub(crate) use define_id;

define_id!(
    /// Unique identifier for a platform user (customer or vendor owner).
    UserId
);
define_id!(
    /// Unique identifier for a vendor (restaurant).
    VendorId
);
