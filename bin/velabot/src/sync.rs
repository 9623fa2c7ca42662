use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use common::Config;
use ingest::{BinanceClient, Ingestor};
use store::CandleStore;

/// Live-updating dataset daemon: syncs the configured partition on a fixed
/// cadence (hourly by default) until interrupted. Safe to restart at any
/// point — the write path is idempotent.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let cfg = Config::from_env();
    info!(symbol = %cfg.symbol, interval = %cfg.interval, "Velabot sync starting");

    let store = CandleStore::connect(&cfg.database_url)
        .await
        .unwrap_or_else(|e| panic!("Failed to open candle store: {e}"));

    let client = Arc::new(BinanceClient::new());
    let ingestor = Ingestor::new(client, store);

    tokio::select! {
        _ = ingestor.run_periodic(
            cfg.symbol,
            cfg.interval,
            cfg.start_date,
            Duration::from_secs(cfg.sync_every_secs),
        ) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
        }
    }
}
