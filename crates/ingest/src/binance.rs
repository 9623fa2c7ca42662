use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use common::{Candle, Error, Interval, MarketDataClient, Result};

const BASE_URL: &str = "https://api.binance.com";

/// Maximum rows per klines request; the exchange caps the endpoint there.
const PAGE_LIMIT: usize = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for the public Binance klines endpoint.
pub struct BinanceClient {
    http: Client,
    base_url: String,
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different host (test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&startTime={}&limit={}",
            self.base_url, symbol, interval, start_ms, PAGE_LIMIT
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }

        let rows: Vec<Value> = serde_json::from_str(&body)?;
        rows.iter()
            .map(|row| parse_kline(symbol, interval, row))
            .collect()
    }
}

#[async_trait]
impl MarketDataClient for BinanceClient {
    async fn historical_candles(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
    ) -> Result<Vec<Candle>> {
        let mut candles = Vec::new();
        let mut cursor = start_ms;

        loop {
            let page = self.fetch_page(symbol, interval, cursor).await?;
            let page_len = page.len();
            debug!(symbol, %interval, cursor, rows = page_len, "Fetched klines page");

            let last_ts = page.last().map(|c| c.timestamp);
            candles.extend(page);

            if page_len < PAGE_LIMIT {
                break;
            }
            // Next page starts one interval past the last received open time.
            match last_ts {
                Some(ts) if ts + interval.duration_ms() > cursor => {
                    cursor = ts + interval.duration_ms();
                }
                _ => break,
            }
        }

        Ok(candles)
    }
}

/// Parse one positional kline row:
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
///   trade_count, taker_buy_base, taker_buy_quote, ...]`.
/// Only indices 0-5 and 7-10 are used.
fn parse_kline(symbol: &str, interval: Interval, row: &Value) -> Result<Candle> {
    let fields = row
        .as_array()
        .ok_or_else(|| Error::MalformedRow(format!("expected array, got: {row}")))?;
    if fields.len() < 11 {
        return Err(Error::MalformedRow(format!(
            "expected at least 11 fields, got {}",
            fields.len()
        )));
    }

    Ok(Candle {
        timestamp: int_field(fields, 0)?,
        symbol: symbol.to_string(),
        interval,
        open: float_field(fields, 1)?,
        high: float_field(fields, 2)?,
        low: float_field(fields, 3)?,
        close: float_field(fields, 4)?,
        volume: float_field(fields, 5)?,
        quote_volume: float_field(fields, 7)?,
        trade_count: int_field(fields, 8)?,
        taker_buy_base_volume: float_field(fields, 9)?,
        taker_buy_quote_volume: float_field(fields, 10)?,
    })
}

/// Numeric fields arrive as JSON strings ("0.0163479") or raw numbers.
fn float_field(fields: &[Value], idx: usize) -> Result<f64> {
    let value = &fields[idx];
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::MalformedRow(format!("field {idx} out of f64 range: {n}"))),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| Error::MalformedRow(format!("field {idx} is not numeric: '{s}'"))),
        other => Err(Error::MalformedRow(format!(
            "field {idx} is not numeric: {other}"
        ))),
    }
}

fn int_field(fields: &[Value], idx: usize) -> Result<i64> {
    fields[idx].as_i64().ok_or_else(|| {
        Error::MalformedRow(format!("field {idx} is not an integer: {}", fields[idx]))
    })
}
