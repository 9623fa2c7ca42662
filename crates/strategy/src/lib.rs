pub mod config;
pub mod engine;
pub mod indicators;
pub mod registry;

pub use config::{StrategyConfig, StrategyFileConfig};
pub use registry::StrategyRegistry;

use common::{Candle, SignalRow};

/// All strategy implementations must satisfy this trait.
pub trait Strategy: Send + Sync {
    /// Name this strategy is registered and selected under.
    fn name(&self) -> &str;

    /// Derive one `SignalRow` per input candle, oldest first.
    ///
    /// Row `i` may only depend on candles `0..=i`, and the first row of a
    /// non-empty series must carry `Signal::None` — no strategy looks
    /// before the start of the series.
    fn signals(&self, candles: &[Candle]) -> Vec<SignalRow>;
}
