use chrono::{NaiveDate, Utc};

use crate::time::parse_date;
use crate::Interval;

/// All configuration loaded from environment variables at startup.
/// Missing or malformed required variables cause an immediate panic with a
/// clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Partition to ingest / backtest
    pub symbol: String,
    pub interval: Interval,

    // Backtest window and parameters
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub strategy: String,
    pub initial_capital: f64,
    pub percent_per_trade: f64,

    // Ingestion cadence
    pub sync_every_secs: u64,

    // Optional strategy config file (TOML); builtins are used when absent
    pub strategy_config_path: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing or unparseable value.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let interval = optional_env("INTERVAL")
            .unwrap_or_else(|| "1h".to_string())
            .parse::<Interval>()
            .unwrap_or_else(|e| panic!("{e}"));

        let start_date = parse_env_date("START_DATE", "2017-01-01");
        let end_date = optional_env("END_DATE")
            .map(|v| {
                parse_date(&v).unwrap_or_else(|e| panic!("END_DATE: {e}"))
            })
            .unwrap_or_else(|| Utc::now().date_naive());

        Config {
            database_url: required_env("DATABASE_URL"),
            symbol: optional_env("SYMBOL").unwrap_or_else(|| "BTCUSDT".to_string()),
            interval,
            start_date,
            end_date,
            strategy: optional_env("STRATEGY").unwrap_or_else(|| "EMA".to_string()),
            initial_capital: parse_env_f64("INITIAL_CAPITAL", 1000.0),
            percent_per_trade: parse_env_f64("PERCENT_PER_TRADE", 10.0),
            sync_every_secs: optional_env("SYNC_INTERVAL_SECS")
                .map(|v| {
                    v.parse().unwrap_or_else(|_| {
                        panic!("SYNC_INTERVAL_SECS must be an integer number of seconds, got: '{v}'")
                    })
                })
                .unwrap_or(3600),
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH"),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_env_date(key: &str, default: &str) -> NaiveDate {
    let value = optional_env(key).unwrap_or_else(|| default.to_string());
    parse_date(&value).unwrap_or_else(|e| panic!("{key}: {e}"))
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    match optional_env(key) {
        Some(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be numeric, got: '{v}'")),
        None => default,
    }
}
