use sqlx::SqlitePool;
use tracing::debug;

use common::{Candle, Interval, Result};

/// Schema migrations for the candle store. Binaries and tests run these
/// against a freshly connected pool before first use.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Durable append-only store of OHLCV candles, keyed by
/// `(timestamp, symbol, interval)`.
///
/// Writes are idempotent: a pre-existing key is silently skipped, so the
/// ingestor can be re-run arbitrarily (crash, restart, overlapping cron
/// fires) without duplicating or corrupting history.
#[derive(Clone)]
pub struct CandleStore {
    pool: SqlitePool,
}

impl CandleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        MIGRATOR.run(&pool).await.map_err(sqlx::Error::from)?;
        Ok(Self::new(pool))
    }

    /// Latest stored candle-open timestamp for the partition, or `None`
    /// when no rows exist. Used by the ingestor as its fetch watermark.
    pub async fn last_timestamp(&self, symbol: &str, interval: Interval) -> Result<Option<i64>> {
        let max: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(timestamp) FROM candlestick_data
            WHERE symbol = ?1 AND interval = ?2
            "#,
        )
        .bind(symbol)
        .bind(interval)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    /// Insert a batch of candles inside one transaction, skipping rows whose
    /// `(timestamp, symbol, interval)` key already exists. Returns the number
    /// of rows actually inserted.
    ///
    /// A storage fault mid-batch aborts the whole transaction; readers never
    /// observe a partially-applied batch.
    pub async fn upsert_many(&self, candles: &[Candle]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for candle in candles {
            let result = sqlx::query(
                r#"
                INSERT INTO candlestick_data (
                    timestamp, symbol, interval, open, high, low, close, volume,
                    quote_asset_volume, number_of_trades,
                    taker_buy_base_asset_volume, taker_buy_quote_asset_volume)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT (timestamp, symbol, interval) DO NOTHING
                "#,
            )
            .bind(candle.timestamp)
            .bind(&candle.symbol)
            .bind(candle.interval)
            .bind(candle.open)
            .bind(candle.high)
            .bind(candle.low)
            .bind(candle.close)
            .bind(candle.volume)
            .bind(candle.quote_volume)
            .bind(candle.trade_count)
            .bind(candle.taker_buy_base_volume)
            .bind(candle.taker_buy_quote_volume)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        debug!(
            batch = candles.len(),
            inserted, "Candle batch committed"
        );
        Ok(inserted)
    }

    /// All candles for the partition with `start_ts <= timestamp <= end_ts`,
    /// ascending by timestamp. An empty window returns an empty vec.
    pub async fn query_range(
        &self,
        symbol: &str,
        interval: Interval,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<Vec<Candle>> {
        let candles = sqlx::query_as::<_, Candle>(
            r#"
            SELECT timestamp, symbol, interval, open, high, low, close, volume,
                   quote_asset_volume, number_of_trades,
                   taker_buy_base_asset_volume, taker_buy_quote_asset_volume
            FROM candlestick_data
            WHERE symbol = ?1 AND interval = ?2
              AND timestamp >= ?3 AND timestamp <= ?4
            ORDER BY timestamp
            "#,
        )
        .bind(symbol)
        .bind(interval)
        .bind(start_ts)
        .bind(end_ts)
        .fetch_all(&self.pool)
        .await?;

        Ok(candles)
    }
}
