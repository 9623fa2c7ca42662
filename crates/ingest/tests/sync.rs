use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;

use common::{time::date_start_ms, Candle, Error, Interval, MarketDataClient, Result};
use ingest::Ingestor;
use store::CandleStore;

const HOUR_MS: i64 = 3_600_000;

/// Serves a fixed candle series, honoring the at-or-after start contract,
/// and records every requested start for assertions.
struct CannedClient {
    candles: Vec<Candle>,
    requested_starts: Mutex<Vec<i64>>,
}

impl CannedClient {
    fn new(candles: Vec<Candle>) -> Arc<Self> {
        Arc::new(Self {
            candles,
            requested_starts: Mutex::new(Vec::new()),
        })
    }

    fn starts(&self) -> Vec<i64> {
        self.requested_starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataClient for CannedClient {
    async fn historical_candles(
        &self,
        _symbol: &str,
        _interval: Interval,
        start_ms: i64,
    ) -> Result<Vec<Candle>> {
        self.requested_starts.lock().unwrap().push(start_ms);
        Ok(self
            .candles
            .iter()
            .filter(|c| c.timestamp >= start_ms)
            .cloned()
            .collect())
    }
}

/// Always fails the way an unreachable exchange does.
struct UnreachableClient;

#[async_trait]
impl MarketDataClient for UnreachableClient {
    async fn historical_candles(
        &self,
        _symbol: &str,
        _interval: Interval,
        _start_ms: i64,
    ) -> Result<Vec<Candle>> {
        Err(Error::Http("connection timed out".into()))
    }
}

async fn test_store() -> CandleStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    store::MIGRATOR.run(&pool).await.unwrap();
    CandleStore::new(pool)
}

fn hourly_series(start: i64, n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| Candle {
            timestamp: start + i as i64 * HOUR_MS,
            symbol: "BTCUSDT".into(),
            interval: Interval::OneHour,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 1.0,
            quote_volume: 100.5,
            trade_count: 10,
            taker_buy_base_volume: 0.5,
            taker_buy_quote_volume: 50.0,
        })
        .collect()
}

fn fallback() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap()
}

#[tokio::test]
async fn first_sync_starts_from_fallback_date() {
    let series_start = date_start_ms(fallback());
    let client = CannedClient::new(hourly_series(series_start, 8));
    let ingestor = Ingestor::new(client.clone(), test_store().await);

    let inserted = ingestor
        .sync("BTCUSDT", Interval::OneHour, fallback())
        .await
        .unwrap();

    assert_eq!(inserted, 8);
    assert_eq!(client.starts(), vec![series_start]);
}

#[tokio::test]
async fn second_sync_resumes_from_watermark_and_dedups_overlap() {
    let series_start = date_start_ms(fallback());
    let client = CannedClient::new(hourly_series(series_start, 10));
    let store = test_store().await;

    // Seed the store with the first 6 candles.
    store
        .upsert_many(&hourly_series(series_start, 6))
        .await
        .unwrap();
    let watermark = series_start + 5 * HOUR_MS;

    let ingestor = Ingestor::new(client.clone(), store.clone());
    let inserted = ingestor
        .sync("BTCUSDT", Interval::OneHour, fallback())
        .await
        .unwrap();

    // The watermark candle is re-fetched (5 rows come back) but only the
    // 4 genuinely new ones land.
    assert_eq!(client.starts(), vec![watermark]);
    assert_eq!(inserted, 4);
    assert_eq!(
        store
            .last_timestamp("BTCUSDT", Interval::OneHour)
            .await
            .unwrap(),
        Some(series_start + 9 * HOUR_MS)
    );
}

#[tokio::test]
async fn rerunning_a_caught_up_sync_inserts_nothing() {
    let series_start = date_start_ms(fallback());
    let client = CannedClient::new(hourly_series(series_start, 5));
    let ingestor = Ingestor::new(client, test_store().await);

    let first = ingestor
        .sync("BTCUSDT", Interval::OneHour, fallback())
        .await
        .unwrap();
    let second = ingestor
        .sync("BTCUSDT", Interval::OneHour, fallback())
        .await
        .unwrap();

    assert_eq!(first, 5);
    assert_eq!(second, 0, "caught-up sync must report zero inserts");
}

#[tokio::test]
async fn network_failure_surfaces_as_retryable_error() {
    let store = test_store().await;
    let ingestor = Ingestor::new(Arc::new(UnreachableClient), store.clone());

    let err = ingestor
        .sync("BTCUSDT", Interval::OneHour, fallback())
        .await
        .unwrap_err();

    assert!(err.is_retryable(), "network faults must be retryable: {err}");
    // Nothing may have been written.
    assert_eq!(
        store
            .last_timestamp("BTCUSDT", Interval::OneHour)
            .await
            .unwrap(),
        None
    );
}
