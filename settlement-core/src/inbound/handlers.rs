//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use settlement_types::{
    AppError, CheckoutRequest, InitiatePaymentRequest, OrderId, PaymentGateway,
    SettlementStore, VerifyPaymentRequest,
};

use crate::{CheckoutService, PaymentService};

/// Application state shared across handlers.
pub struct AppState<R, G>
where
    R: SettlementStore,
    G: PaymentGateway,
{
    pub checkout: CheckoutService<R>,
    pub payments: PaymentService<R, G>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Convert a cart-vendor into an order.
#[tracing::instrument(skip(state), fields(cart_vendor_id = %req.cart_vendor_id))]
pub async fn checkout<R: SettlementStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.checkout.convert_cart_to_order(req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// Get an order with its line items.
#[tracing::instrument(skip(state), fields(order_id = %id))]
pub async fn get_order<R: SettlementStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid order ID".into()))?;

    let detail = state.checkout.get_order(order_id).await?;
    Ok(Json(detail))
}

/// Initiate a gateway payment for an order.
#[tracing::instrument(skip(state), fields(order_id = %req.order_id, amount = req.amount))]
pub async fn initiate_payment<R: SettlementStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.payments.initiate_payment(req).await?;
    Ok(Json(resp))
}

/// Verify a payment attempt with the gateway.
#[tracing::instrument(skip(state), fields(txn_id = %req.txn_id))]
pub async fn verify_payment<R: SettlementStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.payments.verify_payment(req).await?;
    Ok(Json(resp))
}

/// Look up a payment attempt by its gateway transaction id.
#[tracing::instrument(skip(state), fields(txn_id = %txn_id))]
pub async fn get_payment<R: SettlementStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(txn_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state.payments.find_payment(&txn_id).await?;
    Ok(Json(payment))
}
