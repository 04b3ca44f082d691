//! CSV file data adapter.

use crate::domain::error::VixpeError;
use crate::domain::series::RawSeries;
use crate::ports::data_port::DataPort;
use std::fs::File;
use std::path::PathBuf;

/// Reads a CSV file with a header row into a [`RawSeries`].
///
/// Records may have fewer cells than the header; the missing cells surface
/// later as row-level data errors rather than a CSV error.
pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn read_from<R: std::io::Read>(reader: R) -> Result<RawSeries, VixpeError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect());
        }

        Ok(RawSeries::new(headers, records))
    }
}

impl DataPort for CsvAdapter {
    fn load_series(&self) -> Result<RawSeries, VixpeError> {
        let file = File::open(&self.path).map_err(|e| {
            VixpeError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", self.path.display(), e),
            ))
        })?;
        let series = Self::read_from(file)?;
        tracing::info!(
            path = %self.path.display(),
            columns = series.headers.len(),
            rows = series.len(),
            "loaded series"
        );
        Ok(series)
    }
}
