//! Read-only ports onto data owned by external collaborators.

use crate::domain::{CartItem, CartVendor, CartVendorId, UserId, VendorId, VendorPayoutProfile};
use crate::error::RepoError;

/// Read-only view of the cart service's data.
///
/// The settlement core never writes cart rows; it only freezes them into
/// orders at checkout.
#[async_trait::async_trait]
pub trait CartStore: Send + Sync + 'static {
    /// Fetches a cart-vendor, but only if it belongs to an active session
    /// owned by `user_id`.
    async fn get_cart_vendor(
        &self,
        user_id: UserId,
        cart_vendor_id: CartVendorId,
    ) -> Result<Option<CartVendor>, RepoError>;

    /// Lists the line items of a cart-vendor.
    async fn list_cart_items(
        &self,
        cart_vendor_id: CartVendorId,
    ) -> Result<Vec<CartItem>, RepoError>;
}

/// Read-only view of the vendor service's payout account data.
#[async_trait::async_trait]
pub trait VendorDirectory: Send + Sync + 'static {
    /// Fetches the payout profile for a vendor, if one is configured.
    async fn get_payout_profile(
        &self,
        vendor_id: VendorId,
    ) -> Result<Option<VendorPayoutProfile>, RepoError>;
}
