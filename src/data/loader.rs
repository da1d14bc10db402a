use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{
    Measurement, RawDataset, RawRecord, Readings, DOWNTIME_RISK, FAILURE_TYPE, MACHINE,
    MACHINE_STATUS, MAINTENANCE_REQUIRED, REQUIRED_COLUMNS, TIMESTAMP,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong while reading the sensor CSV.
/// All variants are fatal for the session.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: cannot parse timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    Number {
        row: usize,
        column: String,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the sensor CSV (UTF-8, comma separated, header row).
///
/// Blank cells become nulls. Columns other than the required ones (and
/// `downtime_risk`) are kept verbatim in [`RawRecord::extra`].
pub fn load_csv(path: &Path) -> Result<RawDataset, DataLoadError> {
    let reader = csv::Reader::from_path(path).map_err(|source| DataLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = read_csv(reader)?;
    log::info!(
        "Loaded {} rows with {} columns from {}",
        dataset.len(),
        dataset.columns.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse CSV text from any reader. Used by [`load_csv`] and by tests.
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<RawDataset, DataLoadError> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|req| !headers.iter().any(|h| h == *req))
        .map(|req| req.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataLoadError::MissingColumns(missing));
    }

    let index = ColumnIndex::new(&headers);
    let mut records = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        // Row numbers as a spreadsheet shows them: header is row 1.
        let row = i + 2;
        records.push(index.parse_row(&record, row)?);
    }

    Ok(RawDataset {
        records,
        columns: headers,
    })
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

struct ColumnIndex<'h> {
    headers: &'h [String],
    timestamp: usize,
    machine: usize,
    measurements: [usize; 5],
    status: usize,
    maintenance: usize,
    failure: usize,
    downtime: Option<usize>,
}

impl<'h> ColumnIndex<'h> {
    /// Callers must have checked that every required column is present.
    fn new(headers: &'h [String]) -> Self {
        let pos = |name: &str| headers.iter().position(|h| h == name).unwrap_or(usize::MAX);
        ColumnIndex {
            headers,
            timestamp: pos(TIMESTAMP),
            machine: pos(MACHINE),
            measurements: Measurement::ALL.map(|m| pos(m.column())),
            status: pos(MACHINE_STATUS),
            maintenance: pos(MAINTENANCE_REQUIRED),
            failure: pos(FAILURE_TYPE),
            downtime: headers.iter().position(|h| h == DOWNTIME_RISK),
        }
    }

    fn is_known(&self, idx: usize) -> bool {
        idx == self.timestamp
            || idx == self.machine
            || self.measurements.contains(&idx)
            || idx == self.status
            || idx == self.maintenance
            || idx == self.failure
            || Some(idx) == self.downtime
    }

    fn parse_row(&self, record: &csv::StringRecord, row: usize) -> Result<RawRecord, DataLoadError> {
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let ts_raw = cell(self.timestamp);
        let timestamp = parse_timestamp(ts_raw).ok_or_else(|| DataLoadError::Timestamp {
            row,
            value: ts_raw.to_string(),
        })?;

        let mut readings = Readings::<Option<f64>>::default();
        for (m, &idx) in Measurement::ALL.iter().zip(&self.measurements) {
            readings.set(*m, parse_number(cell(idx), row, m.column())?);
        }

        let downtime_risk = match self.downtime {
            Some(idx) => parse_number(cell(idx), row, DOWNTIME_RISK)?,
            None => None,
        };

        let extra = self
            .headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.is_known(*idx))
            .map(|(idx, name)| (name.clone(), cell(idx).to_string()))
            .collect::<BTreeMap<_, _>>();

        Ok(RawRecord {
            timestamp,
            machine: parse_text(cell(self.machine)),
            readings,
            machine_status: parse_text(cell(self.status)),
            maintenance_required: parse_text(cell(self.maintenance)),
            failure_type: parse_text(cell(self.failure)),
            downtime_risk,
            extra,
        })
    }
}

/// Spellings pandas reads as missing.
pub(crate) fn is_null_token(s: &str) -> bool {
    matches!(
        s,
        "" | "nan" | "NaN" | "NAN" | "NA" | "N/A" | "null" | "NULL" | "None"
    )
}

fn parse_text(s: &str) -> Option<String> {
    if is_null_token(s) {
        None
    } else {
        Some(s.to_string())
    }
}

fn parse_number(s: &str, row: usize, column: &str) -> Result<Option<f64>, DataLoadError> {
    if is_null_token(s) {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) if v.is_finite() => Ok(Some(v)),
        // `inf`, `-inf` and overflowing literals are not measurements.
        _ => Err(DataLoadError::Number {
            row,
            column: column.to_string(),
            value: s.to_string(),
        }),
    }
}

/// Parse the timestamp formats found in exported sensor logs.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
