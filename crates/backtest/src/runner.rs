use chrono::NaiveDate;
use tracing::info;

use common::{
    time::date_start_ms, Error, Interval, Result, SignalRow, SimulationResult,
};
use store::CandleStore;
use strategy::{engine, StrategyRegistry};

use crate::simulator;

/// Everything the presentation layer supplies for one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestParams {
    pub symbol: String,
    pub interval: Interval,
    pub start_date: NaiveDate,
    /// Inclusive, at midnight UTC.
    pub end_date: NaiveDate,
    pub strategy: String,
    pub initial_capital: f64,
    pub percent_per_trade: f64,
}

/// The simulation outcome plus the enriched per-bar series for rendering.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub rows: Vec<SignalRow>,
    pub result: SimulationResult,
}

/// Ties store, registry, signal engine, and simulator together for one
/// read/compute pass over stored history.
pub struct Backtester {
    store: CandleStore,
    registry: StrategyRegistry,
}

impl Backtester {
    pub fn new(store: CandleStore, registry: StrategyRegistry) -> Self {
        Self { store, registry }
    }

    pub async fn run(&self, params: &BacktestParams) -> Result<BacktestReport> {
        validate(params)?;

        let start_ts = date_start_ms(params.start_date);
        let end_ts = date_start_ms(params.end_date);

        let candles = self
            .store
            .query_range(&params.symbol, params.interval, start_ts, end_ts)
            .await?;
        if candles.is_empty() {
            return Err(Error::NoData(format!(
                "no candles for {}/{} between {} and {}",
                params.symbol, params.interval, params.start_date, params.end_date
            )));
        }

        let strategy = self.registry.get(&params.strategy).ok_or_else(|| {
            Error::Strategy(format!("strategy '{}' is not available", params.strategy))
        })?;

        let rows = engine::apply(strategy.as_ref(), &candles)?;
        let result = simulator::run(&rows, params.initial_capital, params.percent_per_trade);

        info!(
            symbol = %params.symbol,
            interval = %params.interval,
            strategy = %params.strategy,
            bars = rows.len(),
            strategy_profit = result.strategy_profit,
            buy_and_hold_profit = result.buy_and_hold_profit,
            "Backtest complete"
        );

        Ok(BacktestReport { rows, result })
    }
}

fn validate(params: &BacktestParams) -> Result<()> {
    if !params.initial_capital.is_finite() || params.initial_capital <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "initial capital must be a positive number, got {}",
            params.initial_capital
        )));
    }
    if !params.percent_per_trade.is_finite() || params.percent_per_trade <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "percent per trade must be a positive number, got {}",
            params.percent_per_trade
        )));
    }
    if params.start_date > params.end_date {
        return Err(Error::InvalidInput(format!(
            "start date {} is after end date {}",
            params.start_date, params.end_date
        )));
    }
    Ok(())
}
