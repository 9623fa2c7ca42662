use common::{Candle, Signal, SignalRow, SimulationResult};

/// Replay a signal series against its closes and return the realized
/// profit (`final capital − initial capital`).
///
/// Each trade commits `percent_per_trade` percent of the *initial* capital;
/// `trade_value` stays fixed for the whole run and does not compound with
/// the fluctuating capital. A buy at bar `i` closes out at bar `i+1`'s
/// close; a sell mirrors it. Signals on the last bar have no next close and
/// contribute nothing.
pub fn strategy_profit(rows: &[SignalRow], initial_capital: f64, percent_per_trade: f64) -> f64 {
    let mut capital = initial_capital;
    let trade_value = initial_capital * percent_per_trade / 100.0;

    for i in 1..rows.len() {
        let price = rows[i].close;
        match rows[i].signal {
            Signal::Buy => {
                if let Some(next) = rows.get(i + 1) {
                    let profit = (next.close - price) * (trade_value / price);
                    capital += profit;
                }
            }
            Signal::Sell => {
                if let Some(next) = rows.get(i + 1) {
                    let loss = (price - next.close) * (trade_value / price);
                    capital -= loss;
                }
            }
            Signal::None => {}
        }
    }

    capital - initial_capital
}

/// Profit from holding the asset across the whole window.
/// An empty series yields 0 — the guard runs before any division.
pub fn buy_and_hold(candles: &[Candle], initial_capital: f64) -> f64 {
    match (candles.first(), candles.last()) {
        (Some(first), Some(last)) => hold_profit(first.close, last.close, initial_capital),
        _ => 0.0,
    }
}

/// Both figures for one run. Empty and single-row inputs yield zeros,
/// never a division fault.
pub fn run(rows: &[SignalRow], initial_capital: f64, percent_per_trade: f64) -> SimulationResult {
    let buy_and_hold_profit = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => hold_profit(first.close, last.close, initial_capital),
        _ => 0.0,
    };

    SimulationResult {
        strategy_profit: strategy_profit(rows, initial_capital, percent_per_trade),
        buy_and_hold_profit,
    }
}

fn hold_profit(first_close: f64, last_close: f64, initial_capital: f64) -> f64 {
    (last_close - first_close) * initial_capital / first_close
}
