//! Configuration loading from environment.

use std::env;

use settlement_gateway::GatewayConfig;

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub kafka_brokers: String,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let kafka_brokers =
            env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());

        let gateway = GatewayConfig {
            base_url: env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://a.khalti.com/api/v2".to_string()),
            secret_key: env::var("GATEWAY_SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("GATEWAY_SECRET_KEY environment variable is required"))?,
            return_url: env::var("GATEWAY_RETURN_URL")
                .map_err(|_| anyhow::anyhow!("GATEWAY_RETURN_URL environment variable is required"))?,
            website_url: env::var("GATEWAY_WEBSITE_URL")
                .map_err(|_| anyhow::anyhow!("GATEWAY_WEBSITE_URL environment variable is required"))?,
        };

        Ok(Self {
            port,
            database_url,
            kafka_brokers,
            gateway,
        })
    }
}
