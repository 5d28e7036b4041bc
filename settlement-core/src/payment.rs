//! Payment Application Service
//!
//! Drives the external gateway and the payment ledger: initiation with an
//! in-flight guard and an idempotency gate, verification with an atomic
//! settle plus payout event publication.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use settlement_types::{
    AppError, InitiatePaymentRequest, InitiatePaymentResponse, Money, OrderId, OrderPayment,
    OrderRepository, PaymentAttemptStatus, PaymentGateway, PaymentLedger, PayoutEventBus,
    PayoutRequested, VendorDirectory, VerifyPaymentRequest, VerifyPaymentResponse,
};

/// Application service for payment initiation and verification.
pub struct PaymentService<R, G>
where
    R: OrderRepository + PaymentLedger + VendorDirectory,
    G: PaymentGateway,
{
    repo: Arc<R>,
    gateway: G,
    bus: Arc<dyn PayoutEventBus>,
    // Orders with a gateway initiation currently in flight.
    in_flight: DashMap<OrderId, ()>,
}

/// Removes the in-flight marker when the initiation finishes, on every path.
struct InFlightGuard<'a> {
    orders: &'a DashMap<OrderId, ()>,
    id: OrderId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.orders.remove(&self.id);
    }
}

impl<R, G> PaymentService<R, G>
where
    R: OrderRepository + PaymentLedger + VendorDirectory,
    G: PaymentGateway,
{
    pub fn new(repo: Arc<R>, gateway: G, bus: Arc<dyn PayoutEventBus>) -> Self {
        Self {
            repo,
            gateway,
            bus,
            in_flight: DashMap::new(),
        }
    }

    /// Starts a gateway payment for an order.
    ///
    /// A second concurrent initiation for the same order, or an initiation
    /// for an already-paid order, fails with `Conflict`. The attempt row is
    /// durable before the payment URL is returned.
    pub async fn initiate_payment(
        &self,
        req: InitiatePaymentRequest,
    ) -> Result<InitiatePaymentResponse, AppError> {
        if self.in_flight.insert(req.order_id, ()).is_some() {
            return Err(AppError::Conflict(
                "Payment initiation already in progress for this order".into(),
            ));
        }
        let _guard = InFlightGuard {
            orders: &self.in_flight,
            id: req.order_id,
        };

        let order = self
            .repo
            .get_order(req.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {}", req.order_id)))?;

        if self.repo.find_success_for_order(order.id).await?.is_some() {
            return Err(AppError::Conflict("Order is already paid".into()));
        }

        let amount = Money::new(req.amount, req.currency)?;
        if amount.minor_units() == 0 {
            return Err(AppError::BadRequest("Amount must be positive".into()));
        }
        let expected = order.grand_total()?;
        if amount != expected {
            return Err(AppError::BadRequest(format!(
                "Amount {} does not match the order total {}",
                amount, expected
            )));
        }

        let initiation = self
            .gateway
            .initiate(order.id, amount, &req.order_name)
            .await?;

        let payment = OrderPayment::initiated(order.id, initiation.txn_id.clone(), amount);
        self.repo.insert_attempt(&payment).await?;

        tracing::info!(
            order_id = %order.id,
            txn_id = %initiation.txn_id,
            "payment initiated"
        );

        Ok(InitiatePaymentResponse {
            payment_url: initiation.payment_url,
            txn_id: initiation.txn_id,
        })
    }

    /// Verifies a payment attempt against the gateway.
    ///
    /// `Completed` settles the payment and the order in one repo transaction
    /// and publishes a payout-requested event. Any other gateway status is
    /// recorded verbatim and the order is left untouched. Safe to re-run.
    pub async fn verify_payment(
        &self,
        req: VerifyPaymentRequest,
    ) -> Result<VerifyPaymentResponse, AppError> {
        let payment = self
            .repo
            .find_by_txn(&req.txn_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment attempt {}", req.txn_id)))?;

        let lookup = self.gateway.verify(&req.txn_id).await?;

        if !lookup.is_completed() {
            let status = PaymentAttemptStatus::parse(&lookup.status);
            self.repo.record_status(&req.txn_id, &status).await?;

            tracing::info!(
                order_id = %payment.order_id,
                txn_id = %req.txn_id,
                status = %lookup.status,
                "payment not completed, status recorded"
            );

            return Ok(VerifyPaymentResponse {
                order_id: payment.order_id,
                gateway_status: lookup.status,
                paid: false,
            });
        }

        let settled = self.repo.record_success(&req.txn_id, Utc::now()).await?;

        let order = self
            .repo
            .get_order(settled.order_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Order {} missing", settled.order_id)))?;

        let profile = self
            .repo
            .get_payout_profile(order.vendor_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("No payout profile for vendor {}", order.vendor_id))
            })?;

        let event = PayoutRequested {
            session_id: order.session_id,
            order_id: order.id,
            vendor_user_id: profile.vendor_user_id,
            connected_account_id: profile.connected_account_id,
            payout_account_id: profile.payout_account_id,
            amount: order.grand_total()?.minor_units(),
        };
        self.bus.publish(&event).await?;

        tracing::info!(
            order_id = %order.id,
            txn_id = %req.txn_id,
            "payment verified and payout requested"
        );

        Ok(VerifyPaymentResponse {
            order_id: order.id,
            gateway_status: lookup.status,
            paid: true,
        })
    }

    /// Looks up a payment attempt by its gateway transaction id.
    pub async fn find_payment(&self, txn_id: &str) -> Result<OrderPayment, AppError> {
        self.repo
            .find_by_txn(txn_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment attempt {}", txn_id)))
    }
}
