use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use common::{time::date_start_ms, Interval, MarketDataClient, Result};
use store::CandleStore;

/// Wait before retrying after a connectivity fault.
const RETRY_DELAY: Duration = Duration::from_secs(60);

/// Drives incremental fetch-and-persist cycles against the market-data
/// source, using the store's last timestamp as a watermark.
pub struct Ingestor {
    client: Arc<dyn MarketDataClient>,
    store: CandleStore,
}

impl Ingestor {
    pub fn new(client: Arc<dyn MarketDataClient>, store: CandleStore) -> Self {
        Self { client, store }
    }

    /// One sync cycle: fetch everything from the watermark (or
    /// `fallback_start` on an empty partition) and persist it. Returns the
    /// number of newly inserted rows, post-dedup, so callers can tell
    /// "no new data" from "fetched but all duplicates".
    ///
    /// The source returns candles at-or-after the requested start, so the
    /// most recent stored candle is re-fetched on every cycle and skipped
    /// by the upsert's conflict rule.
    pub async fn sync(
        &self,
        symbol: &str,
        interval: Interval,
        fallback_start: NaiveDate,
    ) -> Result<u64> {
        let start_ms = match self.store.last_timestamp(symbol, interval).await? {
            Some(watermark) => {
                debug!(symbol, %interval, watermark, "Resuming from stored watermark");
                watermark
            }
            None => {
                let start = date_start_ms(fallback_start);
                debug!(symbol, %interval, start, "Empty partition — starting from fallback date");
                start
            }
        };

        let candles = self
            .client
            .historical_candles(symbol, interval, start_ms)
            .await?;
        info!(symbol, %interval, fetched = candles.len(), "Fetched candles from exchange");

        let inserted = self.store.upsert_many(&candles).await?;
        info!(symbol, %interval, inserted, "Sync cycle complete");
        Ok(inserted)
    }

    /// Run `sync` forever on a fixed cadence. Connectivity faults back off
    /// for [`RETRY_DELAY`] and try again; other faults are logged and wait
    /// for the next scheduled cycle. Each cycle is independent and safe to
    /// repeat thanks to the idempotent write path.
    pub async fn run_periodic(
        self,
        symbol: String,
        interval: Interval,
        fallback_start: NaiveDate,
        every: Duration,
    ) {
        info!(symbol = %symbol, %interval, every_secs = every.as_secs(), "Ingestor running");
        loop {
            match self.sync(&symbol, interval, fallback_start).await {
                Ok(0) => info!(symbol = %symbol, "No new candles"),
                Ok(inserted) => info!(symbol = %symbol, inserted, "Ingested new candles"),
                Err(e) if e.is_retryable() => {
                    warn!(symbol = %symbol, error = %e, "Sync failed — retrying in {}s", RETRY_DELAY.as_secs());
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "Sync failed with non-retryable error");
                }
            }
            tokio::time::sleep(every).await;
        }
    }
}
