//! Open position and closed trade records.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn open(entry_price: f64, entry_date: NaiveDate) -> Self {
        Self {
            entry_price,
            entry_date,
        }
    }

    /// Calendar days between entry and `date`.
    pub fn holding_days(&self, date: NaiveDate) -> i64 {
        (date - self.entry_date).num_days()
    }

    pub fn close(self, exit_price: f64, exit_date: NaiveDate) -> Trade {
        Trade {
            entry_date: self.entry_date,
            exit_date,
            entry_price: self.entry_price,
            exit_price,
            return_pct: (exit_price - self.entry_price) / self.entry_price * 100.0,
            holding_days: self.holding_days(exit_date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    #[serde(rename = "Entry Date")]
    pub entry_date: NaiveDate,
    #[serde(rename = "Exit Date")]
    pub exit_date: NaiveDate,
    #[serde(rename = "Entry Price")]
    pub entry_price: f64,
    #[serde(rename = "Exit Price")]
    pub exit_price: f64,
    #[serde(rename = "Return (%)")]
    pub return_pct: f64,
    #[serde(rename = "Holding Days")]
    pub holding_days: i64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.return_pct > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn holding_days_counts_calendar_days() {
        let pos = Position::open(100.0, date(1, 30));
        assert_eq!(pos.holding_days(date(1, 30)), 0);
        assert_eq!(pos.holding_days(date(3, 1)), 31);
    }

    #[test]
    fn close_computes_return_pct() {
        let trade = Position::open(200.0, date(1, 1)).close(230.0, date(1, 11));
        assert_relative_eq!(trade.return_pct, 15.0, epsilon = 1e-12);
        assert_eq!(trade.holding_days, 10);
        assert!(trade.is_win());
    }

    #[test]
    fn flat_trade_is_not_a_win() {
        let trade = Position::open(100.0, date(1, 1)).close(100.0, date(1, 2));
        assert_eq!(trade.return_pct, 0.0);
        assert!(!trade.is_win());
    }

    #[test]
    fn losing_trade() {
        let trade = Position::open(100.0, date(1, 1)).close(90.0, date(1, 5));
        assert_relative_eq!(trade.return_pct, -10.0, epsilon = 1e-12);
        assert!(!trade.is_win());
    }
}
