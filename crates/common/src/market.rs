use async_trait::async_trait;

use crate::{Candle, Interval, Result};

/// Abstraction over the market-data source.
///
/// `BinanceClient` in `crates/ingest` implements this for the live exchange;
/// tests substitute canned or failing clients. The source is expected to
/// return candles at-or-after the requested start, oldest first, and to
/// surface transport failures as errors — never as an empty batch.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetch historical candles for `symbol`/`interval` from `start_ms`
    /// (candle-open time, milliseconds since epoch) up to now.
    async fn historical_candles(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
    ) -> Result<Vec<Candle>>;
}
