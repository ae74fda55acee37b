//! Marketplace HTTP server
//!
//! Usage: `marketplace [config.yaml]`. Without a file the defaults are used;
//! environment overrides (`PORT`, `JWT_SECRET`, `MONGO_URI`, `LOG_LEVEL`)
//! apply either way.

use anyhow::Result;
use marketplace::config::MarketplaceConfig;
use marketplace::server::ServerBuilder;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,marketplace=debug";

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => MarketplaceConfig::from_yaml_file(&path)?,
        None => MarketplaceConfig::default(),
    };
    config.apply_env_overrides()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_level.as_deref().unwrap_or(DEFAULT_FILTER))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = config.socket_addr()?;
    tracing::info!(backend = ?config.storage.backend, "starting marketplace");

    ServerBuilder::from_config(&config)
        .await?
        .serve(&addr.to_string())
        .await
}
