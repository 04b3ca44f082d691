#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use vixpe::domain::backtest::BacktestResult;
use vixpe::domain::error::VixpeError;
pub use vixpe::domain::observation::Observation;
use vixpe::domain::series::RawSeries;
use vixpe::domain::strategy::Strategy;
use vixpe::ports::data_port::DataPort;
use vixpe::ports::report_port::ReportPort;

pub const HEADERS: [&str; 4] = ["Date", "Nifty_Close", "VIX", "Nifty_PE"];

pub struct MockDataPort {
    pub series: RawSeries,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(series: RawSeries) -> Self {
        Self {
            series,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            series: RawSeries::default(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn load_series(&self) -> Result<RawSeries, VixpeError> {
        match &self.error {
            Some(reason) => Err(VixpeError::Io(std::io::Error::other(reason.clone()))),
            None => Ok(self.series.clone()),
        }
    }
}

/// Records every report written, for assertions.
#[derive(Default)]
pub struct RecordingReportPort {
    pub written: RefCell<Vec<(usize, String, String)>>,
}

impl ReportPort for RecordingReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &Strategy,
        output_path: &str,
    ) -> Result<(), VixpeError> {
        self.written.borrow_mut().push((
            result.trades.len(),
            strategy.name.clone(),
            output_path.to_string(),
        ));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Build a raw series with the default column names.
pub fn raw_series(rows: &[(&str, f64, f64, f64)]) -> RawSeries {
    RawSeries::new(
        HEADERS.iter().map(|s| s.to_string()).collect(),
        rows.iter()
            .map(|(d, close, vix, pe)| {
                vec![d.to_string(), close.to_string(), vix.to_string(), pe.to_string()]
            })
            .collect(),
    )
}

pub fn raw_series_with_headers(headers: &[&str], rows: &[&[&str]]) -> RawSeries {
    RawSeries::new(
        headers.iter().map(|s| s.to_string()).collect(),
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    )
}

pub fn obs(date_str: &str, close: f64, vix: f64, pe: f64) -> Observation {
    Observation::new(
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        close,
        vix,
        pe,
    )
}

/// A year of synthetic daily data whose VIX and PE cycle through entry and
/// exit zones.
pub fn generate_cycle(start_date: &str, count: usize) -> Vec<(String, f64, f64, f64)> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let phase = (i % 40) as f64;
            let vix = 10.0 + phase / 3.0;
            let pe = 16.0 + (i % 25) as f64 / 3.0;
            let close = 18_000.0 + (i as f64 * 7.0) - (phase * 11.0);
            (
                (start + chrono::Duration::days(i as i64)).to_string(),
                close,
                vix,
                pe,
            )
        })
        .collect()
}

pub fn to_raw(rows: &[(String, f64, f64, f64)]) -> RawSeries {
    let borrowed: Vec<(&str, f64, f64, f64)> = rows
        .iter()
        .map(|(d, c, a, b)| (d.as_str(), *c, *a, *b))
        .collect();
    raw_series(&borrowed)
}

/// `ExitCode` has no `PartialEq` on every toolchain; compare its debug form.
pub fn assert_exit(actual: std::process::ExitCode, expected: std::process::ExitCode) {
    assert_eq!(format!("{:?}", actual), format!("{:?}", expected));
}
