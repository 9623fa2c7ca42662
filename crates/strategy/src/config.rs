use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Top-level strategy config file (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// type = "ema"
/// name = "EMA"
///
/// [strategy.params]
/// fast = 10
/// slow = 50
///
/// [[strategy]]
/// type = "momentum"
/// name = "Momentum"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy type identifier: "ema" or "momentum".
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Name the strategy is registered and selected under.
    pub name: String,
    /// Indicator-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl StrategyFileConfig {
    /// Load from a TOML file. A missing or unparseable file is a
    /// configuration fault for the caller to handle; it must not take the
    /// process down.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read strategy config '{path}': {e}")))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse strategy config '{path}': {e}")))
    }
}
