//! Raw tabular input, schema validation and row parsing.
//!
//! A [`RawSeries`] is whatever a loader hands over: a header row and string
//! records. Turning it into [`Observation`]s happens in two passes:
//!
//! 1. [`validate_schema`] checks every mapped column exists, reporting all
//!    absent columns at once. Nothing is parsed if this fails.
//! 2. [`parse_observations`] converts each record. In strict mode the first
//!    bad row aborts; in lenient mode bad rows are skipped and counted.

use crate::domain::error::VixpeError;
use crate::domain::observation::Observation;
use chrono::{NaiveDate, NaiveDateTime};

/// Formats tried in order when no explicit date format is configured.
///
/// Numeric slash and dash dates are read month-first; day-first is only tried
/// when the month-first reading is impossible (e.g. `13/01/2024`).
pub const AUTO_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
];

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawSeries {
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { headers, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Header names for the four logical observation fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub date: String,
    pub close: String,
    pub indicator_a: String,
    pub indicator_b: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: "Date".into(),
            close: "Nifty_Close".into(),
            indicator_a: "VIX".into(),
            indicator_b: "Nifty_PE".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DateFormat {
    #[default]
    Auto,
    Fixed(String),
}

impl DateFormat {
    pub fn parse(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        match self {
            DateFormat::Fixed(fmt) => parse_with(value, fmt),
            DateFormat::Auto => AUTO_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .or_else(|| {
                    TIMESTAMP_FORMATS.iter().find_map(|fmt| {
                        NaiveDateTime::parse_from_str(value, fmt)
                            .ok()
                            .map(|dt| dt.date())
                    })
                }),
        }
    }
}

fn parse_with(value: &str, fmt: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, fmt).ok().or_else(|| {
        NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .map(|dt| dt.date())
    })
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndices {
    date: usize,
    close: usize,
    indicator_a: usize,
    indicator_b: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSeries {
    pub observations: Vec<Observation>,
    pub skipped_rows: usize,
}

/// Check that every mapped column exists in the header.
pub fn validate_schema(series: &RawSeries, columns: &ColumnMap) -> Result<(), VixpeError> {
    resolve_columns(series, columns).map(|_| ())
}

fn resolve_columns(series: &RawSeries, columns: &ColumnMap) -> Result<ColumnIndices, VixpeError> {
    let lookup = [
        &columns.date,
        &columns.close,
        &columns.indicator_a,
        &columns.indicator_b,
    ]
    .map(|name| (name, series.column_index(name)));

    let missing: Vec<String> = lookup
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();

    match lookup {
        [(_, Some(date)), (_, Some(close)), (_, Some(indicator_a)), (_, Some(indicator_b))] => {
            Ok(ColumnIndices {
                date,
                close,
                indicator_a,
                indicator_b,
            })
        }
        _ => Err(VixpeError::Schema { missing }),
    }
}

/// Validate the schema, then parse every record into an [`Observation`].
///
/// The returned observations are in input order; sorting is the engine's job.
pub fn parse_observations(
    series: &RawSeries,
    columns: &ColumnMap,
    date_format: &DateFormat,
    lenient: bool,
) -> Result<ParsedSeries, VixpeError> {
    let indices = resolve_columns(series, columns)?;
    let mut parsed = ParsedSeries::default();

    for (row, record) in series.records.iter().enumerate() {
        match parse_record(row, record, indices, columns, date_format) {
            Ok(obs) => parsed.observations.push(obs),
            Err(err) if lenient => {
                tracing::warn!(row, error = %err, "skipping malformed row");
                parsed.skipped_rows += 1;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(parsed)
}

fn parse_record(
    row: usize,
    record: &[String],
    indices: ColumnIndices,
    columns: &ColumnMap,
    date_format: &DateFormat,
) -> Result<Observation, VixpeError> {
    let date_raw = cell(row, record, indices.date, &columns.date)?;
    let date = date_format
        .parse(date_raw)
        .ok_or_else(|| data_error(row, &columns.date, date_raw, "unparseable date"))?;

    let close = parse_number(row, record, indices.close, &columns.close)?;
    if close <= 0.0 {
        return Err(data_error(
            row,
            &columns.close,
            &record[indices.close],
            "close price must be positive",
        ));
    }

    let indicator_a = parse_number(row, record, indices.indicator_a, &columns.indicator_a)?;
    let indicator_b = parse_number(row, record, indices.indicator_b, &columns.indicator_b)?;

    Ok(Observation {
        row,
        date,
        close,
        indicator_a,
        indicator_b,
    })
}

fn cell<'a>(
    row: usize,
    record: &'a [String],
    idx: usize,
    field: &str,
) -> Result<&'a str, VixpeError> {
    match record.get(idx).map(|s| s.trim()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(data_error(row, field, "", "missing value")),
    }
}

fn parse_number(
    row: usize,
    record: &[String],
    idx: usize,
    field: &str,
) -> Result<f64, VixpeError> {
    let raw = cell(row, record, idx, field)?;
    let value: f64 = strip_thousands(raw)
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| data_error(row, field, raw, "not a number"))?;
    if !value.is_finite() {
        return Err(data_error(row, field, raw, "value must be finite"));
    }
    Ok(value)
}

/// Remove thousands separators from a number like `22,147.90`.
///
/// Commas are only accepted in groups of three digits in the integer part;
/// anything else (`13,5`, `1,0,0`) returns `None`.
fn strip_thousands(raw: &str) -> Option<String> {
    if !raw.contains(',') {
        return Some(raw.to_string());
    }
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let mut groups = int_part.split(',');
    let lead_ok = groups
        .next()
        .is_some_and(|g| all_digits(g) && g.len() <= 3);
    if !lead_ok || !groups.all(|g| g.len() == 3 && all_digits(g)) {
        return None;
    }
    if frac_part.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    Some(raw.replace(',', ""))
}

fn data_error(row: usize, field: &str, value: &str, reason: &str) -> VixpeError {
    VixpeError::DataFormat {
        row,
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
