//! Trade statistics.
//!
//! All percentages are expressed on a 0-100 scale. Every field is 0 when
//! there are no trades.

use super::position::Trade;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    /// Share of trades with a strictly positive return, in percent.
    pub win_rate: f64,
    /// Arithmetic mean of per-trade `return_pct`.
    pub avg_return: f64,
    pub best_return: f64,
    pub worst_return: f64,
    pub avg_holding_days: f64,
    /// Compounded return of taking every trade in sequence, in percent.
    pub total_return: f64,
}

impl Metrics {
    pub fn compute(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Metrics::default();
        }

        let mut metrics = Metrics {
            total_trades: trades.len(),
            best_return: f64::NEG_INFINITY,
            worst_return: f64::INFINITY,
            ..Metrics::default()
        };
        let mut sum_return = 0.0_f64;
        let mut growth = 1.0_f64;
        let mut total_days = 0i64;

        for trade in trades {
            let r = trade.return_pct;
            if r > 0.0 {
                metrics.trades_won += 1;
            } else if r < 0.0 {
                metrics.trades_lost += 1;
            } else {
                metrics.trades_breakeven += 1;
            }
            metrics.best_return = metrics.best_return.max(r);
            metrics.worst_return = metrics.worst_return.min(r);
            sum_return += r;
            growth *= 1.0 + r / 100.0;
            total_days += trade.holding_days;
        }

        let n = trades.len() as f64;
        metrics.win_rate = metrics.trades_won as f64 / n * 100.0;
        metrics.avg_return = sum_return / n;
        metrics.avg_holding_days = total_days as f64 / n;
        metrics.total_return = (growth - 1.0) * 100.0;
        metrics
    }
}
