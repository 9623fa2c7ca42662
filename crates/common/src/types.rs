use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Candle aggregation interval supported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum Interval {
    #[serde(rename = "1m")]
    #[sqlx(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    #[sqlx(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    #[sqlx(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    #[sqlx(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    #[sqlx(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    #[sqlx(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    #[sqlx(rename = "1d")]
    OneDay,
}

impl Interval {
    /// Exchange-facing interval token, e.g. "1h".
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }

    /// Fixed duration of one candle in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Interval::OneMinute => 60_000,
            Interval::FiveMinutes => 5 * 60_000,
            Interval::FifteenMinutes => 15 * 60_000,
            Interval::ThirtyMinutes => 30 * 60_000,
            Interval::OneHour => 60 * 60_000,
            Interval::FourHours => 4 * 60 * 60_000,
            Interval::OneDay => 24 * 60 * 60_000,
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "1h" => Ok(Interval::OneHour),
            "4h" => Ok(Interval::FourHours),
            "1d" => Ok(Interval::OneDay),
            other => Err(crate::Error::Config(format!(
                "unknown interval '{other}' (expected one of 1m, 5m, 15m, 30m, 1h, 4h, 1d)"
            ))),
        }
    }
}

/// One OHLCV candle as stored in `candlestick_data`.
///
/// `timestamp` is the candle-open time in milliseconds since epoch (UTC).
/// `(timestamp, symbol, interval)` is the primary key; candles are written
/// once by the ingestor and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Candle {
    pub timestamp: i64,
    pub symbol: String,
    pub interval: Interval,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[sqlx(rename = "quote_asset_volume")]
    pub quote_volume: f64,
    #[sqlx(rename = "number_of_trades")]
    pub trade_count: i64,
    #[sqlx(rename = "taker_buy_base_asset_volume")]
    pub taker_buy_base_volume: f64,
    #[sqlx(rename = "taker_buy_quote_asset_volume")]
    pub taker_buy_quote_volume: f64,
}

/// Per-bar classification emitted by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    None,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Buy => write!(f, "buy"),
            Signal::Sell => write!(f, "sell"),
            Signal::None => write!(f, "none"),
        }
    }
}

/// One row of a strategy's output series: the input bar's close, the
/// indicator columns the strategy computed for that bar, and the signal.
/// The first row of any series always carries `Signal::None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub timestamp: i64,
    pub close: f64,
    pub indicators: BTreeMap<String, f64>,
    pub signal: Signal,
}

/// Outcome of one backtest run, denominated in the currency of the
/// configured initial capital. Recomputed on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy_profit: f64,
    pub buy_and_hold_profit: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_round_trips_through_str() {
        for s in ["1m", "5m", "15m", "30m", "1h", "4h", "1d"] {
            let interval: Interval = s.parse().unwrap();
            assert_eq!(interval.as_str(), s);
        }
    }

    #[test]
    fn interval_rejects_unknown_token() {
        assert!("2h".parse::<Interval>().is_err());
    }

    #[test]
    fn interval_durations_are_strictly_increasing() {
        let ordered = [
            Interval::OneMinute,
            Interval::FiveMinutes,
            Interval::FifteenMinutes,
            Interval::ThirtyMinutes,
            Interval::OneHour,
            Interval::FourHours,
            Interval::OneDay,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].duration_ms() < pair[1].duration_ms());
        }
    }
}
