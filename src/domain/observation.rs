//! Typed market observation (one row of the input series).

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Index of the source record in the raw input.
    pub row: usize,
    pub date: NaiveDate,
    pub close: f64,
    /// Volatility index reading (India VIX for the default data set).
    pub indicator_a: f64,
    /// Valuation ratio reading (Nifty P/E for the default data set).
    pub indicator_b: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, close: f64, indicator_a: f64, indicator_b: f64) -> Self {
        Self {
            row: 0,
            date,
            close,
            indicator_a,
            indicator_b,
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }
}

/// Sort observations ascending by date. Stable: same-date rows keep input order.
pub fn sort_by_date(observations: &mut [Observation]) {
    observations.sort_by_key(|o| o.date);
}
