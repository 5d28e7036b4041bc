//! Service tests with in-memory mock ports.
//!
//! One `MockRepo` implements every storage port over mutex-guarded maps, so
//! the services run the real orchestration against deterministic adapters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use settlement_types::{
    AddressId, AppError, CartItem, CartItemId, CartStore, CartVendor, CartVendorId,
    CheckoutRequest, Currency, GatewayError, GatewayInitiation, GatewayLookup,
    InitiatePaymentRequest, MenuItemId, Money, OrderId, OrderItem, OrderPayment,
    OrderRepository, OrderVendor, PaymentAttemptStatus, PaymentGateway, PaymentLedger,
    PaymentStatus, Payout, PayoutEventBus, PayoutRepository, PayoutRequested, PublishError,
    RepoError, SessionId, UserId, VendorDirectory, VendorId, VendorPayoutProfile,
    VerifyPaymentRequest,
};

use crate::{CheckoutService, PaymentService, PayoutService};

// ─────────────────────────────────────────────────────────────────────────────
// Mock adapters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockRepo {
    carts: Mutex<HashMap<CartVendorId, (UserId, CartVendor)>>,
    cart_items: Mutex<Vec<CartItem>>,
    orders: Mutex<HashMap<OrderId, OrderVendor>>,
    order_items: Mutex<Vec<OrderItem>>,
    payments: Mutex<Vec<OrderPayment>>,
    payouts: Mutex<Vec<Payout>>,
    profiles: Mutex<HashMap<VendorId, VendorPayoutProfile>>,
}

#[async_trait::async_trait]
impl CartStore for MockRepo {
    async fn get_cart_vendor(
        &self,
        user_id: UserId,
        cart_vendor_id: CartVendorId,
    ) -> Result<Option<CartVendor>, RepoError> {
        Ok(self
            .carts
            .lock()
            .unwrap()
            .get(&cart_vendor_id)
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, cart)| cart.clone()))
    }

    async fn list_cart_items(
        &self,
        cart_vendor_id: CartVendorId,
    ) -> Result<Vec<CartItem>, RepoError> {
        Ok(self
            .cart_items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.cart_vendor_id == cart_vendor_id)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl VendorDirectory for MockRepo {
    async fn get_payout_profile(
        &self,
        vendor_id: VendorId,
    ) -> Result<Option<VendorPayoutProfile>, RepoError> {
        Ok(self.profiles.lock().unwrap().get(&vendor_id).cloned())
    }
}

#[async_trait::async_trait]
impl OrderRepository for MockRepo {
    async fn create_order(
        &self,
        order: &OrderVendor,
        items: &[OrderItem],
    ) -> Result<(), RepoError> {
        let mut orders = self.orders.lock().unwrap();
        if orders
            .values()
            .any(|o| o.cart_vendor_id == order.cart_vendor_id)
        {
            return Err(RepoError::Conflict("Cart-vendor already checked out".into()));
        }
        orders.insert(order.id, order.clone());
        self.order_items.lock().unwrap().extend_from_slice(items);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderVendor>, RepoError> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepoError> {
        Ok(self
            .order_items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl PaymentLedger for MockRepo {
    async fn insert_attempt(&self, payment: &OrderPayment) -> Result<(), RepoError> {
        let mut payments = self.payments.lock().unwrap();
        if payments.iter().any(|p| p.txn_id == payment.txn_id) {
            return Err(RepoError::Conflict("Duplicate transaction id".into()));
        }
        payments.push(payment.clone());
        Ok(())
    }

    async fn find_success_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderPayment>, RepoError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.order_id == order_id && p.status.is_success())
            .cloned())
    }

    async fn find_by_txn(&self, txn_id: &str) -> Result<Option<OrderPayment>, RepoError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.txn_id == txn_id)
            .cloned())
    }

    async fn record_success(
        &self,
        txn_id: &str,
        paid_at: chrono::DateTime<Utc>,
    ) -> Result<OrderPayment, RepoError> {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments
            .iter_mut()
            .find(|p| p.txn_id == txn_id)
            .ok_or(RepoError::NotFound)?;
        payment.status = PaymentAttemptStatus::Success;
        payment.paid_at = Some(paid_at);
        let updated = payment.clone();

        let mut orders = self.orders.lock().unwrap();
        if let Some(order) = orders.get_mut(&updated.order_id) {
            order.payment_status = PaymentStatus::Paid;
        }
        Ok(updated)
    }

    async fn record_status(
        &self,
        txn_id: &str,
        status: &PaymentAttemptStatus,
    ) -> Result<(), RepoError> {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments
            .iter_mut()
            .find(|p| p.txn_id == txn_id)
            .ok_or(RepoError::NotFound)?;
        payment.status = status.clone();
        Ok(())
    }
}

#[async_trait::async_trait]
impl PayoutRepository for MockRepo {
    async fn insert_payout(&self, payout: &Payout) -> Result<(), RepoError> {
        let mut payouts = self.payouts.lock().unwrap();
        if payouts.iter().any(|p| p.order_id == payout.order_id) {
            return Err(RepoError::Conflict("Order already has a payout".into()));
        }
        payouts.push(payout.clone());
        Ok(())
    }

    async fn find_payout_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payout>, RepoError> {
        Ok(self
            .payouts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned())
    }
}

#[derive(Default)]
struct GatewayState {
    fail_initiate: AtomicBool,
    lookup_status: Mutex<String>,
    counter: AtomicUsize,
}

#[derive(Clone, Default)]
struct MockGateway {
    inner: Arc<GatewayState>,
}

impl MockGateway {
    fn set_fail_initiate(&self, fail: bool) {
        self.inner.fail_initiate.store(fail, Ordering::SeqCst);
    }

    fn set_lookup_status(&self, status: &str) {
        *self.inner.lookup_status.lock().unwrap() = status.to_string();
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    async fn initiate(
        &self,
        _order_id: OrderId,
        _amount: Money,
        _order_name: &str,
    ) -> Result<GatewayInitiation, GatewayError> {
        if self.inner.fail_initiate.load(Ordering::SeqCst) {
            return Err(GatewayError::Unreachable("connection refused".into()));
        }
        let n = self.inner.counter.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayInitiation {
            txn_id: format!("pidx-{}", n),
            payment_url: format!("https://gateway.test/pay/pidx-{}", n),
            expires_at: None,
            expires_in: None,
        })
    }

    async fn verify(&self, txn_id: &str) -> Result<GatewayLookup, GatewayError> {
        let status = self.inner.lookup_status.lock().unwrap().clone();
        Ok(GatewayLookup {
            txn_id: txn_id.to_string(),
            total_amount: 113500,
            status,
            transaction_id: Some("GFq9PFS7b2iYvL8Lir9oXe".into()),
            fee: 0,
            refunded: false,
        })
    }
}

#[derive(Default)]
struct MockBus {
    events: Mutex<Vec<PayoutRequested>>,
    fail: AtomicBool,
}

#[async_trait::async_trait]
impl PayoutEventBus for MockBus {
    async fn publish(&self, event: &PayoutRequested) -> Result<(), PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Broker("broker down".into()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────────

struct Harness {
    repo: Arc<MockRepo>,
    gateway: MockGateway,
    bus: Arc<MockBus>,
    checkout: CheckoutService<MockRepo>,
    payments: PaymentService<MockRepo, MockGateway>,
    user_id: UserId,
    cart_vendor_id: CartVendorId,
    vendor_id: VendorId,
    vendor_user_id: UserId,
}

fn npr(amount: i64) -> Money {
    Money::new(amount, Currency::NPR).unwrap()
}

impl Harness {
    /// Cart worth 1000.00 + 100.00 delivery + 20.00 service + 15.00 VAT,
    /// no discount, split over three line items.
    fn new() -> Self {
        let repo = Arc::new(MockRepo::default());
        let gateway = MockGateway::default();
        gateway.set_lookup_status("Completed");
        let bus = Arc::new(MockBus::default());

        let user_id = UserId::new();
        let vendor_id = VendorId::new();
        let vendor_user_id = UserId::new();
        let cart = CartVendor {
            id: CartVendorId::new(),
            session_id: SessionId::new(),
            vendor_id,
            subtotal: npr(100000),
            delivery_charge: npr(10000),
            vendor_service_charge: npr(2000),
            vat: npr(1500),
            discount: npr(0),
            created_at: Utc::now(),
        };
        let cart_vendor_id = cart.id;

        let items = [(2, 20000, 0), (1, 50000, 0), (1, 10000, 0)];
        let mut cart_items = Vec::new();
        for (quantity, unit_price, discount) in items {
            cart_items.push(CartItem {
                id: CartItemId::new(),
                cart_vendor_id,
                item_id: MenuItemId::new(),
                quantity,
                unit_price: npr(unit_price),
                discount: npr(discount),
                instructions: None,
                created_at: Utc::now(),
            });
        }

        repo.carts
            .lock()
            .unwrap()
            .insert(cart_vendor_id, (user_id, cart));
        *repo.cart_items.lock().unwrap() = cart_items;
        repo.profiles.lock().unwrap().insert(
            vendor_id,
            VendorPayoutProfile {
                vendor_id,
                vendor_user_id,
                connected_account_id: "acct_1FgemYLjoZ5eta".into(),
                payout_account_id: "ba_9OaFhnLjoZ5et2".into(),
            },
        );

        let checkout = CheckoutService::new(repo.clone());
        let payments = PaymentService::new(repo.clone(), gateway.clone(), bus.clone());

        Self {
            repo,
            gateway,
            bus,
            checkout,
            payments,
            user_id,
            cart_vendor_id,
            vendor_id,
            vendor_user_id,
        }
    }

    fn checkout_request(&self) -> CheckoutRequest {
        CheckoutRequest {
            user_id: self.user_id,
            cart_vendor_id: self.cart_vendor_id,
            delivery_address_id: AddressId::new(),
            instructions: Some("ring the bell".into()),
            expected_delivery_time: Utc::now(),
        }
    }

    async fn place_order(&self) -> OrderId {
        self.checkout
            .convert_cart_to_order(self.checkout_request())
            .await
            .unwrap()
            .order_id
    }

    fn initiate_request(&self, order_id: OrderId) -> InitiatePaymentRequest {
        InitiatePaymentRequest {
            order_id,
            amount: 113500,
            currency: Currency::NPR,
            order_name: "Order from Test Vendor".into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Checkout
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_checkout_freezes_cart_totals() {
    let h = Harness::new();
    let order_id = h.place_order().await;

    let detail = h.checkout.get_order(order_id).await.unwrap();
    assert_eq!(detail.order.subtotal, npr(100000));
    assert_eq!(detail.order.delivery_charge, npr(10000));
    assert_eq!(detail.order.vendor_service_charge, npr(2000));
    assert_eq!(detail.order.vat, npr(1500));
    assert_eq!(detail.order.discount, npr(0));
    assert_eq!(detail.order.grand_total().unwrap(), npr(113500));
    assert_eq!(detail.order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(detail.items.len(), 3);

    let items_total: i64 = detail.items.iter().map(|i| i.subtotal.minor_units()).sum();
    assert_eq!(items_total, detail.order.subtotal.minor_units());
}

#[tokio::test]
async fn test_checkout_unknown_cart_is_not_found() {
    let h = Harness::new();
    let mut req = h.checkout_request();
    req.cart_vendor_id = CartVendorId::new();

    let err = h.checkout.convert_cart_to_order(req).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(h.repo.orders.lock().unwrap().is_empty());
    assert!(h.repo.order_items.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_foreign_cart_is_not_found() {
    let h = Harness::new();
    let mut req = h.checkout_request();
    req.user_id = UserId::new();

    let err = h.checkout.convert_cart_to_order(req).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_checkout_empty_cart_is_rejected() {
    let h = Harness::new();
    h.repo.cart_items.lock().unwrap().clear();

    let err = h
        .checkout
        .convert_cart_to_order(h.checkout_request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(h.repo.orders.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_stale_subtotal_is_rejected() {
    let h = Harness::new();
    // Drop a line item without re-pricing the cart.
    h.repo.cart_items.lock().unwrap().pop();

    let err = h
        .checkout
        .convert_cart_to_order(h.checkout_request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_checkout_same_cart_twice_conflicts() {
    let h = Harness::new();
    h.place_order().await;

    let err = h
        .checkout
        .convert_cart_to_order(h.checkout_request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(h.repo.orders.lock().unwrap().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment initiation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_initiate_persists_attempt_before_response() {
    let h = Harness::new();
    let order_id = h.place_order().await;

    let resp = h
        .payments
        .initiate_payment(h.initiate_request(order_id))
        .await
        .unwrap();

    let stored = h.payments.find_payment(&resp.txn_id).await.unwrap();
    assert_eq!(stored.order_id, order_id);
    assert_eq!(stored.status, PaymentAttemptStatus::Initiated);
    assert_eq!(stored.amount, npr(113500));
    assert!(stored.paid_at.is_none());
}

#[tokio::test]
async fn test_initiate_unknown_order_is_not_found() {
    let h = Harness::new();
    let err = h
        .payments
        .initiate_payment(h.initiate_request(OrderId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_initiate_amount_mismatch_is_rejected() {
    let h = Harness::new();
    let order_id = h.place_order().await;

    let mut req = h.initiate_request(order_id);
    req.amount = 99999;

    let err = h.payments.initiate_payment(req).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_initiate_for_paid_order_conflicts() {
    let h = Harness::new();
    let order_id = h.place_order().await;

    let resp = h
        .payments
        .initiate_payment(h.initiate_request(order_id))
        .await
        .unwrap();
    h.payments
        .verify_payment(VerifyPaymentRequest {
            txn_id: resp.txn_id,
        })
        .await
        .unwrap();

    for _ in 0..2 {
        let err = h
            .payments
            .initiate_payment(h.initiate_request(order_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    let successes = h
        .repo
        .payments
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p.status.is_success())
        .count();
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_initiate_guard_released_after_gateway_failure() {
    let h = Harness::new();
    let order_id = h.place_order().await;

    h.gateway.set_fail_initiate(true);
    let err = h
        .payments
        .initiate_payment(h.initiate_request(order_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
    assert!(h.repo.payments.lock().unwrap().is_empty());

    // The in-flight marker must not leak past a failed attempt.
    h.gateway.set_fail_initiate(false);
    assert!(
        h.payments
            .initiate_payment(h.initiate_request(order_id))
            .await
            .is_ok()
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment verification
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_verify_completed_settles_and_publishes() {
    let h = Harness::new();
    let order_id = h.place_order().await;
    let resp = h
        .payments
        .initiate_payment(h.initiate_request(order_id))
        .await
        .unwrap();

    let verified = h
        .payments
        .verify_payment(VerifyPaymentRequest {
            txn_id: resp.txn_id.clone(),
        })
        .await
        .unwrap();
    assert!(verified.paid);
    assert_eq!(verified.order_id, order_id);
    assert_eq!(verified.gateway_status, "Completed");

    let payment = h.payments.find_payment(&resp.txn_id).await.unwrap();
    assert!(payment.status.is_success());
    assert!(payment.paid_at.is_some());

    let order = h.checkout.get_order(order_id).await.unwrap().order;
    assert_eq!(order.payment_status, PaymentStatus::Paid);

    let events = h.bus.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].order_id, order_id);
    assert_eq!(events[0].session_id, order.session_id);
    assert_eq!(events[0].vendor_user_id, h.vendor_user_id);
    assert_eq!(events[0].connected_account_id, "acct_1FgemYLjoZ5eta");
    assert_eq!(events[0].payout_account_id, "ba_9OaFhnLjoZ5et2");
    assert_eq!(events[0].amount, 113500);
}

#[tokio::test]
async fn test_verify_other_status_is_recorded_verbatim() {
    let h = Harness::new();
    let order_id = h.place_order().await;
    let resp = h
        .payments
        .initiate_payment(h.initiate_request(order_id))
        .await
        .unwrap();

    h.gateway.set_lookup_status("Pending");
    let verified = h
        .payments
        .verify_payment(VerifyPaymentRequest {
            txn_id: resp.txn_id.clone(),
        })
        .await
        .unwrap();
    assert!(!verified.paid);
    assert_eq!(verified.gateway_status, "Pending");

    let payment = h.payments.find_payment(&resp.txn_id).await.unwrap();
    assert_eq!(payment.status, PaymentAttemptStatus::Other("Pending".into()));

    let order = h.checkout.get_order(order_id).await.unwrap().order;
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert!(h.bus.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_unknown_txn_is_not_found() {
    let h = Harness::new();
    let err = h
        .payments
        .verify_payment(VerifyPaymentRequest {
            txn_id: "pidx-missing".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_verify_rerun_after_publish_failure() {
    let h = Harness::new();
    let order_id = h.place_order().await;
    let resp = h
        .payments
        .initiate_payment(h.initiate_request(order_id))
        .await
        .unwrap();

    h.bus.fail.store(true, Ordering::SeqCst);
    let err = h
        .payments
        .verify_payment(VerifyPaymentRequest {
            txn_id: resp.txn_id.clone(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));

    // The settle landed; the retry only has to re-publish.
    let payment = h.payments.find_payment(&resp.txn_id).await.unwrap();
    assert!(payment.status.is_success());

    h.bus.fail.store(false, Ordering::SeqCst);
    let verified = h
        .payments
        .verify_payment(VerifyPaymentRequest {
            txn_id: resp.txn_id,
        })
        .await
        .unwrap();
    assert!(verified.paid);
    assert_eq!(h.bus.events.lock().unwrap().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Payout settlement
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_payout_settle_is_idempotent() {
    let h = Harness::new();
    let order_id = h.place_order().await;

    let event = PayoutRequested {
        session_id: SessionId::new(),
        order_id,
        vendor_user_id: h.vendor_user_id,
        connected_account_id: "acct_1FgemYLjoZ5eta".into(),
        payout_account_id: "ba_9OaFhnLjoZ5et2".into(),
        amount: 113500,
    };

    let payouts = PayoutService::new(h.repo.clone());
    payouts.settle(event.clone()).await.unwrap();
    payouts.settle(event).await.unwrap();

    let stored = h.repo.payouts.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].order_id, order_id);
    assert_eq!(stored[0].amount, npr(113500));
    assert!(!stored[0].transfer_ref.is_empty());
}

#[tokio::test]
async fn test_payout_profile_seeded_for_vendor() {
    let h = Harness::new();
    let profile = h
        .repo
        .get_payout_profile(h.vendor_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.vendor_user_id, h.vendor_user_id);
}
