//! Checkout Application Service
//!
//! Converts a priced cart-vendor into a durable order with frozen totals.
//! Contains NO infrastructure logic - pure business orchestration.

use std::sync::Arc;

use settlement_types::{
    AppError, CartStore, CheckoutRequest, CheckoutResponse, Money, OrderDetail, OrderId,
    OrderItem, OrderRepository, OrderVendor,
};

/// Application service for checkout.
///
/// Generic over the cart and order storage ports - the adapter is injected at
/// compile time.
pub struct CheckoutService<R: CartStore + OrderRepository> {
    repo: Arc<R>,
}

impl<R: CartStore + OrderRepository> CheckoutService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Converts one cart-vendor into an order.
    ///
    /// The cart must belong to an active session owned by the requesting
    /// user; the cart totals and every line item are frozen verbatim. Insert
    /// is atomic, and a second checkout of the same cart-vendor fails with
    /// `Conflict`.
    pub async fn convert_cart_to_order(
        &self,
        req: CheckoutRequest,
    ) -> Result<CheckoutResponse, AppError> {
        let cart = self
            .repo
            .get_cart_vendor(req.user_id, req.cart_vendor_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cart-vendor {}", req.cart_vendor_id)))?;

        let cart_items = self.repo.list_cart_items(cart.id).await?;
        if cart_items.is_empty() {
            return Err(AppError::BadRequest("Cart has no items".into()));
        }

        let order = OrderVendor::from_cart(
            &cart,
            req.user_id,
            req.delivery_address_id,
            req.instructions,
            req.expected_delivery_time,
        );

        let items = cart_items
            .iter()
            .map(|item| OrderItem::from_cart_item(order.id, item))
            .collect::<Result<Vec<_>, _>>()?;

        // Pricing-snapshot invariant: line items must add up to the cart's
        // own subtotal, or the cart is stale and must be re-priced.
        let mut items_total = Money::zero(cart.subtotal.currency());
        for item in &items {
            items_total = items_total.checked_add(item.subtotal)?;
        }
        if items_total != cart.subtotal {
            return Err(AppError::BadRequest(
                "Cart subtotal does not match its items".into(),
            ));
        }

        self.repo.create_order(&order, &items).await?;

        tracing::info!(
            order_id = %order.id,
            cart_vendor_id = %cart.id,
            "cart converted to order"
        );

        Ok(CheckoutResponse { order_id: order.id })
    }

    /// Gets an order with its line items.
    pub async fn get_order(&self, id: OrderId) -> Result<OrderDetail, AppError> {
        let order = self
            .repo
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {}", id)))?;

        let items = self.repo.list_order_items(id).await?;

        Ok(OrderDetail { order, items })
    }
}
