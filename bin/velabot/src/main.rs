use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use backtest::{Backtester, BacktestParams};
use common::Config;
use store::CandleStore;
use strategy::{StrategyFileConfig, StrategyRegistry};

/// One-shot backtest over stored history: applies the configured strategy
/// to the configured window and prints the result next to the
/// buy-and-hold baseline.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let cfg = Config::from_env();

    let store = CandleStore::connect(&cfg.database_url)
        .await
        .unwrap_or_else(|e| panic!("Failed to open candle store: {e}"));

    let registry = build_registry(&cfg);
    if registry.is_empty() {
        warn!("No strategies registered");
    }

    let params = BacktestParams {
        symbol: cfg.symbol.clone(),
        interval: cfg.interval,
        start_date: cfg.start_date,
        end_date: cfg.end_date,
        strategy: cfg.strategy.clone(),
        initial_capital: cfg.initial_capital,
        percent_per_trade: cfg.percent_per_trade,
    };

    let backtester = Backtester::new(store, registry);
    match backtester.run(&params).await {
        Ok(report) => {
            println!("Strategy: {}", params.strategy);
            println!(
                "{} {} from {} to {} ({} bars)",
                params.symbol,
                params.interval,
                params.start_date,
                params.end_date,
                report.rows.len()
            );
            println!("Initial capital:   {}", format_money(params.initial_capital));
            println!(
                "Strategy profit:   {}",
                format_money(report.result.strategy_profit)
            );
            println!(
                "Buy & hold profit: {}",
                format_money(report.result.buy_and_hold_profit)
            );
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn build_registry(cfg: &Config) -> StrategyRegistry {
    match &cfg.strategy_config_path {
        Some(path) => match StrategyFileConfig::load(path) {
            Ok(file_cfg) => StrategyRegistry::from_config(&file_cfg),
            Err(e) => {
                warn!(error = %e, "Strategy config unusable — falling back to builtins");
                StrategyRegistry::builtin()
            }
        },
        None => StrategyRegistry::builtin(),
    }
}

/// Format an amount without decimals, with thousands separators and a
/// dollar sign, e.g. `-1234567.8` → `-$1,234,568`.
fn format_money(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::format_money;

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(999.4), "$999");
        assert_eq!(format_money(1000.0), "$1,000");
        assert_eq!(format_money(1234567.8), "$1,234,568");
        assert_eq!(format_money(-50421.2), "-$50,421");
    }
}
