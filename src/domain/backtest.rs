//! Backtest engine.
//!
//! [`run_backtest`] validates and parses a [`RawSeries`], then hands the
//! observations to [`simulate`], a single pass over date-sorted observations
//! with a two-state position tracker:
//!
//! - `FLAT`: the entry rule is checked; when true a position opens at the
//!   observation's close.
//! - `HOLDING`: the exit rule is checked (with `holding_days` bound); when
//!   true the position closes at the observation's close and a [`Trade`] is
//!   recorded.
//!
//! A position still open after the last observation produces no trade.

use crate::domain::error::VixpeError;
use crate::domain::metrics::Metrics;
use crate::domain::observation::{Observation, sort_by_date};
use crate::domain::position::{Position, Trade};
use crate::domain::rule_eval::{EvalContext, evaluate};
use crate::domain::series::{ColumnMap, DateFormat, RawSeries, parse_observations};
use crate::domain::strategy::Strategy;

/// How the raw input is read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestConfig {
    pub columns: ColumnMap,
    pub date_format: DateFormat,
    /// Skip malformed rows instead of failing the run.
    pub lenient: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub win_rate: f64,
    pub avg_return: f64,
    pub metrics: Metrics,
    /// Observations that took part in the simulation.
    pub observations: usize,
    pub skipped_rows: usize,
}

impl BacktestResult {
    fn from_trades(trades: Vec<Trade>, observations: usize, skipped_rows: usize) -> Self {
        let metrics = Metrics::compute(&trades);
        Self {
            win_rate: metrics.win_rate,
            avg_return: metrics.avg_return,
            trades,
            metrics,
            observations,
            skipped_rows,
        }
    }
}

pub fn run_backtest(
    series: &RawSeries,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, VixpeError> {
    let parsed = parse_observations(
        series,
        &config.columns,
        &config.date_format,
        config.lenient,
    )?;

    let trades = simulate(&parsed.observations, strategy);
    let result = BacktestResult::from_trades(
        trades,
        parsed.observations.len(),
        parsed.skipped_rows,
    );

    tracing::info!(
        strategy = %strategy.name,
        observations = result.observations,
        skipped = result.skipped_rows,
        trades = result.trades.len(),
        win_rate = result.win_rate,
        avg_return = result.avg_return,
        "backtest complete"
    );
    Ok(result)
}

/// Run the position state machine over `observations`.
///
/// The input is sorted by date (stable) before scanning, so callers need not
/// pre-sort.
pub fn simulate(observations: &[Observation], strategy: &Strategy) -> Vec<Trade> {
    let mut sorted = observations.to_vec();
    sort_by_date(&mut sorted);

    let mut trades = Vec::new();
    let mut position: Option<Position> = None;

    for obs in &sorted {
        position = match position.take() {
            None => {
                if evaluate(&strategy.entry, &EvalContext::flat(obs)) {
                    tracing::debug!(date = %obs.date, price = obs.close, row = obs.row, "entry");
                    Some(Position::open(obs.close, obs.date))
                } else {
                    None
                }
            }
            Some(open) => {
                let ctx = EvalContext::holding(obs, open.holding_days(obs.date));
                if evaluate(&strategy.exit, &ctx) {
                    let trade = open.close(obs.close, obs.date);
                    tracing::debug!(
                        date = %obs.date,
                        price = obs.close,
                        row = obs.row,
                        return_pct = trade.return_pct,
                        "exit"
                    );
                    trades.push(trade);
                    None
                } else {
                    Some(open)
                }
            }
        };
    }

    if let Some(open) = position {
        tracing::debug!(
            entry_date = %open.entry_date,
            entry_price = open.entry_price,
            "position still open at end of series; not counted"
        );
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule_parser::parse;
    use crate::domain::strategy::{EntryCombine, ThresholdRules};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn obs(day: u32, close: f64, a: f64, b: f64) -> Observation {
        Observation::new(d(day), close, a, b)
    }

    fn no_holding_exit() -> Strategy {
        ThresholdRules {
            max_holding_days: None,
            ..ThresholdRules::default()
        }
        .into_strategy("test")
    }

    #[test]
    fn enter_then_exit_on_indicator_a() {
        let series = vec![obs(1, 100.0, 13.0, 17.0), obs(2, 100.0, 20.0, 17.0)];
        let trades = simulate(&series, &Strategy::default());
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_date, d(1));
        assert_eq!(trades[0].exit_date, d(2));
        assert_eq!(trades[0].entry_price, 100.0);
        assert_eq!(trades[0].exit_price, 100.0);
        assert_eq!(trades[0].return_pct, 0.0);
    }

    #[test]
    fn no_entry_when_predicate_never_holds() {
        let series = vec![obs(1, 100.0, 15.0, 17.0), obs(2, 101.0, 14.0, 19.0)];
        assert!(simulate(&series, &Strategy::default()).is_empty());
    }

    #[test]
    fn entry_on_last_observation_is_dropped() {
        let series = vec![obs(1, 100.0, 15.0, 17.0), obs(2, 101.0, 12.0, 17.0)];
        assert!(simulate(&series, &Strategy::default()).is_empty());
    }

    #[test]
    fn open_position_at_end_excluded_but_earlier_trades_kept() {
        let series = vec![
            obs(1, 100.0, 12.0, 17.0),
            obs(2, 110.0, 19.0, 17.0),
            obs(3, 105.0, 12.0, 17.0),
            obs(4, 108.0, 14.0, 17.0),
        ];
        let trades = simulate(&series, &Strategy::default());
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_date, d(2));
    }

    #[test]
    fn exit_and_entry_never_on_same_observation() {
        // Entry and exit are both always true, so the tracker must alternate.
        let strategy = Strategy {
            name: "always".into(),
            description: String::new(),
            entry: parse("ABOVE(close, 0)").unwrap(),
            exit: parse("ABOVE(close, 0)").unwrap(),
        };
        let series = vec![
            obs(1, 100.0, 0.0, 0.0),
            obs(2, 101.0, 0.0, 0.0),
            obs(3, 102.0, 0.0, 0.0),
            obs(4, 103.0, 0.0, 0.0),
        ];
        let trades = simulate(&series, &strategy);
        // Enter d1, exit d2, enter d3, exit d4.
        assert_eq!(trades.len(), 2);
        assert_eq!((trades[0].entry_date, trades[0].exit_date), (d(1), d(2)));
        assert_eq!((trades[1].entry_date, trades[1].exit_date), (d(3), d(4)));
    }

    #[test]
    fn holding_period_exit() {
        let series = vec![
            obs(1, 100.0, 12.0, 17.0),
            obs(15, 104.0, 14.0, 17.0),
            obs(30, 106.0, 14.0, 17.0),
            obs(31, 107.0, 14.0, 17.0),
        ];
        let trades = simulate(&series, &Strategy::default());
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_date, d(31));
        assert_eq!(trades[0].holding_days, 30);
        assert_relative_eq!(trades[0].return_pct, 7.0, epsilon = 1e-9);

        assert!(simulate(&series, &no_holding_exit()).is_empty());
    }

    #[test]
    fn exit_on_indicator_b() {
        let series = vec![obs(1, 100.0, 12.0, 17.0), obs(2, 90.0, 12.0, 22.0)];
        let trades = simulate(&series, &Strategy::default());
        assert_eq!(trades.len(), 1);
        assert_relative_eq!(trades[0].return_pct, -10.0, epsilon = 1e-9);
    }

    #[test]
    fn and_versus_or_changes_trade_frequency() {
        let series = vec![
            obs(1, 100.0, 12.0, 19.0), // VIX ok, PE too high
            obs(2, 101.0, 18.5, 19.0), // exit signal
            obs(3, 102.0, 14.0, 17.0), // PE ok, VIX too high
            obs(4, 103.0, 19.0, 17.0), // exit signal
        ];
        let and_trades = simulate(&series, &Strategy::default());
        assert!(and_trades.is_empty());

        let or_strategy = ThresholdRules {
            entry_combine: EntryCombine::Or,
            ..ThresholdRules::default()
        }
        .into_strategy("or");
        let or_trades = simulate(&series, &or_strategy);
        assert_eq!(or_trades.len(), 2);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let sorted = vec![
            obs(1, 100.0, 12.0, 17.0),
            obs(2, 105.0, 19.0, 17.0),
            obs(3, 103.0, 12.0, 17.0),
            obs(4, 101.0, 12.0, 23.0),
        ];
        let shuffled = vec![
            sorted[2].clone(),
            sorted[0].clone(),
            sorted[3].clone(),
            sorted[1].clone(),
        ];
        assert_eq!(
            simulate(&sorted, &Strategy::default()),
            simulate(&shuffled, &Strategy::default())
        );
    }

    #[test]
    fn same_date_ties_keep_input_order() {
        // Two rows share day 2; the first (VIX 19) must be seen before the
        // second, so the exit happens at price 110.
        let series = vec![
            obs(1, 100.0, 12.0, 17.0).with_row(0),
            obs(2, 110.0, 19.0, 17.0).with_row(1),
            obs(2, 120.0, 12.0, 17.0).with_row(2),
        ];
        let trades = simulate(&series, &Strategy::default());
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_price, 110.0);
    }

    #[test]
    fn empty_series() {
        assert!(simulate(&[], &Strategy::default()).is_empty());
    }

    fn raw(rows: &[[&str; 4]]) -> RawSeries {
        RawSeries::new(
            ["Date", "Nifty_Close", "VIX", "Nifty_PE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn run_backtest_produces_statistics() {
        let series = raw(&[
            ["2024-01-01", "100", "12", "17"],
            ["2024-01-02", "110", "19", "17"],
            ["2024-01-03", "100", "12", "17"],
            ["2024-01-04", "95", "12", "23"],
        ]);
        let result =
            run_backtest(&series, &Strategy::default(), &BacktestConfig::default()).unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.observations, 4);
        assert_eq!(result.skipped_rows, 0);
        assert_relative_eq!(result.win_rate, 50.0);
        assert_relative_eq!(result.avg_return, 2.5, epsilon = 1e-9);
        assert_eq!(result.win_rate, result.metrics.win_rate);
    }

    #[test]
    fn run_backtest_zero_trades_is_ok() {
        let series = raw(&[["2024-01-01", "100", "25", "25"]]);
        let result =
            run_backtest(&series, &Strategy::default(), &BacktestConfig::default()).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.avg_return, 0.0);
    }

    #[test]
    fn run_backtest_strict_fails_on_bad_row() {
        let series = raw(&[
            ["2024-01-01", "100", "12", "17"],
            ["2024-01-02", "oops", "19", "17"],
        ]);
        let err =
            run_backtest(&series, &Strategy::default(), &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, VixpeError::DataFormat { row: 1, .. }));
    }

    #[test]
    fn run_backtest_lenient_skips_bad_row() {
        let series = raw(&[
            ["2024-01-01", "100", "12", "17"],
            ["2024-01-02", "oops", "19", "17"],
            ["2024-01-03", "104", "19", "17"],
        ]);
        let config = BacktestConfig {
            lenient: true,
            ..BacktestConfig::default()
        };
        let result = run_backtest(&series, &Strategy::default(), &config).unwrap();
        assert_eq!(result.skipped_rows, 1);
        assert_eq!(result.observations, 2);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].exit_date, d(3));
    }
}
