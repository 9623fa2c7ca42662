use common::{Candle, Error, Result, Signal, SignalRow};

use crate::Strategy;

/// Run a strategy over an ordered candle series and enforce the series
/// contract: one output row per input candle, and no signal on the first
/// bar. A violation is a plugin fault isolated to that strategy — the
/// caller surfaces it as "strategy unavailable" and continues.
pub fn apply(strategy: &dyn Strategy, candles: &[Candle]) -> Result<Vec<SignalRow>> {
    let rows = strategy.signals(candles);

    if rows.len() != candles.len() {
        return Err(Error::Strategy(format!(
            "strategy '{}' produced {} rows for {} candles",
            strategy.name(),
            rows.len(),
            candles.len()
        )));
    }
    if let Some(first) = rows.first() {
        if first.signal != Signal::None {
            return Err(Error::Strategy(format!(
                "strategy '{}' signaled on the first bar",
                strategy.name()
            )));
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::StrategyRegistry;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: i as i64 * 60_000,
                symbol: "BTCUSDT".into(),
                interval: common::Interval::OneMinute,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
                quote_volume: close,
                trade_count: 1,
                taker_buy_base_volume: 0.5,
                taker_buy_quote_volume: 0.5 * close,
            })
            .collect()
    }

    /// Emits a fixed row count regardless of input, violating the contract.
    struct TruncatingStrategy;

    impl Strategy for TruncatingStrategy {
        fn name(&self) -> &str {
            "Truncating"
        }

        fn signals(&self, _candles: &[Candle]) -> Vec<SignalRow> {
            Vec::new()
        }
    }

    /// Signals on the very first bar, violating the contract.
    struct EagerStrategy;

    impl Strategy for EagerStrategy {
        fn name(&self) -> &str {
            "Eager"
        }

        fn signals(&self, candles: &[Candle]) -> Vec<SignalRow> {
            candles
                .iter()
                .map(|c| SignalRow {
                    timestamp: c.timestamp,
                    close: c.close,
                    indicators: BTreeMap::new(),
                    signal: Signal::Buy,
                })
                .collect()
        }
    }

    #[test]
    fn well_behaved_strategy_passes_through() {
        let registry = StrategyRegistry::builtin();
        let strategy = registry.get("EMA").unwrap();
        let candles = candles_from_closes(&[100.0, 101.0, 102.0]);

        let rows = apply(strategy.as_ref(), &candles).unwrap();
        assert_eq!(rows.len(), candles.len());
        assert_eq!(rows[0].signal, Signal::None);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let registry = StrategyRegistry::builtin();
        let strategy = registry.get("Momentum").unwrap();
        assert!(apply(strategy.as_ref(), &[]).unwrap().is_empty());
    }

    #[test]
    fn length_mismatch_is_a_plugin_fault() {
        let candles = candles_from_closes(&[100.0, 101.0]);
        let err = apply(&TruncatingStrategy, &candles).unwrap_err();
        assert!(matches!(err, Error::Strategy(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn first_bar_signal_is_a_plugin_fault() {
        let candles = candles_from_closes(&[100.0, 101.0]);
        let err = apply(&EagerStrategy, &candles).unwrap_err();
        assert!(matches!(err, Error::Strategy(_)));
    }
}
