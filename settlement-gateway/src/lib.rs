//! # Settlement Gateway
//!
//! A typed reqwest client for the external payment provider's
//! initiate/lookup endpoints (Khalti-style wire format). Implements the
//! `PaymentGateway` port.
//!
//! Calls are synchronous request/response with a bounded timeout and no
//! local retry - a failed call surfaces as `GatewayError` and the caller
//! retries the whole operation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use settlement_types::{
    GatewayError, GatewayInitiation, GatewayLookup, Money, OrderId, PaymentGateway,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway API, e.g. `https://a.khalti.com/api/v2`.
    pub base_url: String,
    /// Platform API key, sent as a key-auth header.
    pub secret_key: String,
    /// Where the gateway redirects the customer after payment.
    pub return_url: String,
    /// The storefront URL shown on the payment page.
    pub website_url: String,
}

/// Payment gateway HTTP client.
pub struct KhaltiGateway {
    config: GatewayConfig,
    http: Client,
}

impl KhaltiGateway {
    /// Creates a new client with the default request timeout.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Creates a new client with an explicit request timeout.
    pub fn with_timeout(config: GatewayConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        Ok(Self {
            config: GatewayConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            http,
        })
    }

    async fn post<T: serde::de::DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let resp = self
            .http
            .post(format!("{}{}", self.config.base_url, path))
            .header("Authorization", format!("Key {}", self.config.secret_key))
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
                .unwrap_or(text);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct InitiateBody<'a> {
    return_url: &'a str,
    website_url: &'a str,
    /// Amount in the gateway's minor unit.
    amount: i64,
    purchase_order_id: String,
    purchase_order_name: &'a str,
}

#[derive(Deserialize)]
struct InitiateReply {
    pidx: String,
    payment_url: String,
    expires_at: Option<DateTime<Utc>>,
    expires_in: Option<i64>,
}

#[derive(Serialize)]
struct LookupBody<'a> {
    pidx: &'a str,
}

#[derive(Deserialize)]
struct LookupReply {
    pidx: String,
    total_amount: i64,
    status: String,
    transaction_id: Option<String>,
    #[serde(default)]
    fee: i64,
    #[serde(default)]
    refunded: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// PaymentGateway port
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl PaymentGateway for KhaltiGateway {
    async fn initiate(
        &self,
        order_id: OrderId,
        amount: Money,
        order_name: &str,
    ) -> Result<GatewayInitiation, GatewayError> {
        let body = InitiateBody {
            return_url: &self.config.return_url,
            website_url: &self.config.website_url,
            amount: amount.minor_units(),
            purchase_order_id: order_id.to_string(),
            purchase_order_name: order_name,
        };

        let reply: InitiateReply = self.post("/epayment/initiate/", &body).await?;

        tracing::debug!(order_id = %order_id, txn_id = %reply.pidx, "payment initiated");

        Ok(GatewayInitiation {
            txn_id: reply.pidx,
            payment_url: reply.payment_url,
            expires_at: reply.expires_at,
            expires_in: reply.expires_in,
        })
    }

    async fn verify(&self, txn_id: &str) -> Result<GatewayLookup, GatewayError> {
        let reply: LookupReply = self
            .post("/epayment/lookup/", &LookupBody { pidx: txn_id })
            .await?;

        Ok(GatewayLookup {
            txn_id: reply.pidx,
            total_amount: reply.total_amount,
            status: reply.status,
            transaction_id: reply.transaction_id,
            fee: reply.fee,
            refunded: reply.refunded,
        })
    }
}
