//! CSV trade table report adapter.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::VixpeError;
use crate::domain::position::Trade;
use crate::domain::strategy::Strategy;
use crate::ports::report_port::ReportPort;
use std::fs::File;

/// Writes one row per closed trade, with a header row even when there are
/// no trades.
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn write_trades<W: std::io::Write>(trades: &[Trade], writer: W) -> Result<(), VixpeError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record([
            "Entry Date",
            "Exit Date",
            "Entry Price",
            "Exit Price",
            "Return (%)",
            "Holding Days",
        ])?;
        for trade in trades {
            wtr.serialize(trade)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &Strategy,
        output_path: &str,
    ) -> Result<(), VixpeError> {
        let file = File::create(output_path)?;
        Self::write_trades(&result.trades, file)?;
        tracing::info!(
            path = output_path,
            strategy = %strategy.name,
            trades = result.trades.len(),
            "wrote trade report"
        );
        Ok(())
    }
}
