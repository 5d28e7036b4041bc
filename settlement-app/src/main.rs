//! # Settlement Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository, gateway, and event bus adapters
//! - Create the checkout and payment services
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settlement_core::{CheckoutService, PaymentService, inbound::HttpServer};
use settlement_events::KafkaPayoutBus;
use settlement_gateway::KhaltiGateway;
use settlement_repo::build_repo;

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("settlement-service"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize OpenTelemetry tracing
    let (otel_tracer, otel_provider) = init_tracer()?;
    let telemetry = tracing_opentelemetry::layer().with_tracer(otel_tracer);

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,settlement_app=debug,settlement_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting settlement server on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);

    // Build adapters (repo handles connection and migration)
    let repo = Arc::new(build_repo(&config.database_url).await?);
    let gateway = KhaltiGateway::new(config.gateway.clone())
        .map_err(|e| anyhow::anyhow!("gateway client: {}", e))?;
    let bus = Arc::new(KafkaPayoutBus::new(&config.kafka_brokers)?);

    // Create the application services
    let checkout = CheckoutService::new(repo.clone());
    let payments = PaymentService::new(repo, gateway, bus);

    // Create and run the HTTP server
    let server = HttpServer::new(checkout, payments);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    let _ = otel_provider.shutdown();
    Ok(())
}
