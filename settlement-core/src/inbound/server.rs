//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use settlement_types::{PaymentGateway, SettlementStore};

use super::handlers::{self, AppState};
use crate::{CheckoutService, PaymentService};

/// HTTP Server for the settlement API.
pub struct HttpServer<R, G>
where
    R: SettlementStore,
    G: PaymentGateway,
{
    state: Arc<AppState<R, G>>,
}

impl<R, G> HttpServer<R, G>
where
    R: SettlementStore,
    G: PaymentGateway,
{
    /// Creates a new HTTP server with the given services.
    pub fn new(checkout: CheckoutService<R>, payments: PaymentService<R, G>) -> Self {
        Self {
            state: Arc::new(AppState { checkout, payments }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/checkout", post(handlers::checkout::<R, G>))
            .route("/api/orders/{id}", get(handlers::get_order::<R, G>))
            .route(
                "/api/payments/initiate",
                post(handlers::initiate_payment::<R, G>),
            )
            .route(
                "/api/payments/verify",
                post(handlers::verify_payment::<R, G>),
            )
            .route("/api/payments/{txn_id}", get(handlers::get_payment::<R, G>))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
