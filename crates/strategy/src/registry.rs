use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{info, warn};

use common::{Candle, Error, Result, Signal, SignalRow};

use crate::config::{StrategyConfig, StrategyFileConfig};
use crate::indicators::ema_series;
use crate::Strategy;

/// Holds the discovered strategy instances, keyed by name.
///
/// Discovery is a static constructor table keyed by the config `type`
/// field; there is no runtime code loading. Each discovery pass builds a
/// fresh registry — nothing accumulates across scans.
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    const DEFAULT_FAST_SPAN: usize = 10;
    const DEFAULT_SLOW_SPAN: usize = 50;

    /// The shipped strategies with default parameters. Used when no
    /// strategy config file is present.
    pub fn builtin() -> Self {
        let defaults = StrategyFileConfig {
            strategies: vec![
                StrategyConfig {
                    strategy_type: "ema".into(),
                    name: "EMA".into(),
                    params: HashMap::new(),
                },
                StrategyConfig {
                    strategy_type: "momentum".into(),
                    name: "Momentum".into(),
                    params: HashMap::new(),
                },
            ],
        };
        Self::from_config(&defaults)
    }

    /// Build a registry from config. A definition that fails to build is
    /// logged and skipped — one broken strategy must not block discovery of
    /// the rest. Duplicate names keep the latest definition.
    pub fn from_config(file_cfg: &StrategyFileConfig) -> Self {
        let mut strategies: HashMap<String, Arc<dyn Strategy>> = HashMap::new();

        for cfg in &file_cfg.strategies {
            match build_strategy(cfg) {
                Ok(strategy) => {
                    let name = strategy.name().to_string();
                    info!(name = %name, kind = %cfg.strategy_type, "Registered strategy");
                    if strategies.insert(name.clone(), strategy).is_some() {
                        warn!(name = %name, "Duplicate strategy name — latest definition wins");
                    }
                }
                Err(e) => {
                    warn!(kind = %cfg.strategy_type, error = %e, "Skipping strategy definition");
                }
            }
        }

        Self { strategies }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(name).cloned()
    }

    /// Registered names, sorted for stable presentation.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

// ─── Strategy builders ────────────────────────────────────────────────────────

fn build_strategy(cfg: &StrategyConfig) -> Result<Arc<dyn Strategy>> {
    if cfg.name.trim().is_empty() {
        return Err(Error::Strategy("definition has no name".into()));
    }

    match cfg.strategy_type.as_str() {
        "ema" => {
            let fast = param_usize(&cfg.params, "fast", StrategyRegistry::DEFAULT_FAST_SPAN);
            let slow = param_usize(&cfg.params, "slow", StrategyRegistry::DEFAULT_SLOW_SPAN);
            Ok(Arc::new(EmaCrossStrategy::new(&cfg.name, fast, slow)?))
        }
        "momentum" => Ok(Arc::new(MomentumStrategy::new(&cfg.name))),
        other => Err(Error::Strategy(format!("unknown type '{other}'"))),
    }
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.as_integer())
        .map(|v| v as usize)
        .unwrap_or(default)
}

// ─── Concrete strategy types ──────────────────────────────────────────────────

/// Fast/slow EMA crossover.
///
/// Buy when the fast EMA crosses from at-or-below to strictly above the
/// slow EMA, sell on the mirror crossing; no crossing (and the first bar)
/// yields no signal.
struct EmaCrossStrategy {
    name: String,
    fast_span: usize,
    slow_span: usize,
    fast_column: String,
    slow_column: String,
}

impl EmaCrossStrategy {
    fn new(name: &str, fast_span: usize, slow_span: usize) -> Result<Self> {
        if fast_span == 0 || slow_span == 0 {
            return Err(Error::Strategy("EMA spans must be positive".into()));
        }
        if fast_span >= slow_span {
            return Err(Error::Strategy(format!(
                "EMA fast span ({fast_span}) must be less than slow span ({slow_span})"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            fast_span,
            slow_span,
            fast_column: format!("EMA{fast_span}"),
            slow_column: format!("EMA{slow_span}"),
        })
    }
}

impl Strategy for EmaCrossStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn signals(&self, candles: &[Candle]) -> Vec<SignalRow> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast = ema_series(&closes, self.fast_span);
        let slow = ema_series(&closes, self.slow_span);

        candles
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                let signal = if i == 0 {
                    Signal::None
                } else if fast[i] > slow[i] && fast[i - 1] <= slow[i - 1] {
                    Signal::Buy
                } else if fast[i] < slow[i] && fast[i - 1] >= slow[i - 1] {
                    Signal::Sell
                } else {
                    Signal::None
                };

                let mut indicators = BTreeMap::new();
                indicators.insert(self.fast_column.clone(), fast[i]);
                indicators.insert(self.slow_column.clone(), slow[i]);

                SignalRow {
                    timestamp: candle.timestamp,
                    close: candle.close,
                    indicators,
                    signal,
                }
            })
            .collect()
    }
}

/// Period-over-period price direction: rise buys, fall sells.
struct MomentumStrategy {
    name: String,
}

impl MomentumStrategy {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn signals(&self, candles: &[Candle]) -> Vec<SignalRow> {
        candles
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                let change = if i == 0 {
                    0.0
                } else {
                    candle.close - candles[i - 1].close
                };
                let signal = if i == 0 || change == 0.0 {
                    Signal::None
                } else if change > 0.0 {
                    Signal::Buy
                } else {
                    Signal::Sell
                };

                let mut indicators = BTreeMap::new();
                indicators.insert("change".to_string(), change);

                SignalRow {
                    timestamp: candle.timestamp,
                    close: candle.close,
                    indicators,
                    signal,
                }
            })
            .collect()
    }
}
