//! Daily CSV loading for the runner.
//!
//! Reads a daily file with a date column, an index level column and a binary
//! signal column. Rows stay in file order: the engine rejects unsorted or
//! duplicated dates instead of having them repaired here.
//!
//! Blank, NaN and infinite index levels are kept as gaps (`None`) for the
//! preprocessor to fill.
//! Blank or non-binary signals are rejected outright.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use creditlab_core::DailyObservation;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::DataConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("row {row}: unparseable date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row} ({date}): signal is missing")]
    MissingSignal { row: usize, date: NaiveDate },

    #[error("row {row} ({date}): signal must be 0 or 1, got '{value}'")]
    NonBinarySignal {
        row: usize,
        date: NaiveDate,
        value: String,
    },

    #[error("row {row} ({date}): index level is missing and could not be filled")]
    MissingIndexLevel { row: usize, date: NaiveDate },

    #[error("no rows left after applying the date filter")]
    NoRows,
}

/// One parsed CSV row before gap filling.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDailyRow {
    /// 1-based data row in the source file (header excluded).
    pub row: usize,
    pub date: NaiveDate,
    /// `None` for a blank or NaN cell.
    pub index_level: Option<f64>,
    pub signal: u8,
}

/// Rows read from one source, plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub rows: Vec<RawDailyRow>,
    /// Display label for the source (file stem).
    pub source: String,
    /// Rows skipped by the date filter.
    pub filtered_out: usize,
}

impl LoadedSeries {
    pub fn gap_count(&self) -> usize {
        self.rows.iter().filter(|r| r.index_level.is_none()).count()
    }
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Load a daily CSV described by `cfg`.
pub fn load_daily_csv(path: &Path, cfg: &DataConfig) -> Result<LoadedSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    read_daily_csv(file, cfg, &source)
}

/// Same as [`load_daily_csv`] over any reader.
pub fn read_daily_csv<R: Read>(
    reader: R,
    cfg: &DataConfig,
    source: &str,
) -> Result<LoadedSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_idx = column_index(&headers, &cfg.date_column)?;
    let level_idx = column_index(&headers, &cfg.index_column)?;
    let signal_idx = column_index(&headers, &cfg.signal_column)?;

    let mut rows = Vec::new();
    let mut filtered_out = 0usize;

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let raw_date = cell(date_idx);
        let date = parse_date(raw_date).ok_or_else(|| LoadError::InvalidDate {
            row,
            value: raw_date.to_string(),
        })?;

        if cfg.start_date.is_some_and(|start| date < start)
            || cfg.end_date.is_some_and(|end| date > end)
        {
            filtered_out += 1;
            continue;
        }

        let index_level = parse_optional_f64(cell(level_idx)).ok_or_else(|| {
            LoadError::InvalidNumber {
                row,
                column: cfg.index_column.clone(),
                value: cell(level_idx).to_string(),
            }
        })?;
        let signal = parse_signal(cell(signal_idx), row, date)?;

        rows.push(RawDailyRow {
            row,
            date,
            index_level,
            signal,
        });
    }

    if rows.is_empty() {
        return Err(LoadError::NoRows);
    }

    let series = LoadedSeries {
        rows,
        source: source.to_string(),
        filtered_out,
    };
    debug!(
        source,
        rows = series.rows.len(),
        filtered_out,
        gaps = series.gap_count(),
        "loaded daily csv"
    );
    Ok(series)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| LoadError::MissingColumn {
            column: name.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `MM/DD/YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

fn is_null(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("nan") || v.eq_ignore_ascii_case("null")
}

/// `Some(None)` for a null or infinite cell, `None` when the cell is not a number.
fn parse_optional_f64(value: &str) -> Option<Option<f64>> {
    if is_null(value) {
        return Some(None);
    }
    let parsed = value.trim().parse::<f64>().ok()?;
    Some(parsed.is_finite().then_some(parsed))
}

fn parse_signal(value: &str, row: usize, date: NaiveDate) -> Result<u8, LoadError> {
    if is_null(value) {
        return Err(LoadError::MissingSignal { row, date });
    }
    let non_binary = || LoadError::NonBinarySignal {
        row,
        date,
        value: value.to_string(),
    };
    // "1.0" shows up when a float column was written out
    let parsed: f64 = value.trim().parse().map_err(|_| non_binary())?;
    if parsed == 0.0 {
        Ok(0)
    } else if parsed == 1.0 {
        Ok(1)
    } else {
        Err(non_binary())
    }
}

// ─── Column description ─────────────────────────────────────────────

/// Null statistics for one CSV column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub non_null: usize,
    pub null_count: usize,
    /// Percent in `[0, 100]`.
    pub null_pct: f64,
    pub unique_values: usize,
}

/// Shape of a CSV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvDescription {
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
    /// First and last parseable values of the date column, in file order.
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Per-column null counts and distinct values for a CSV file.
pub fn describe_csv(path: &Path, date_column: &str) -> Result<CsvDescription, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    describe_reader(file, date_column)
}

pub fn describe_reader<R: Read>(reader: R, date_column: &str) -> Result<CsvDescription, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let date_idx = column_index(&headers, date_column)?;

    let mut nulls = vec![0usize; headers.len()];
    let mut distinct: Vec<HashSet<String>> = vec![HashSet::new(); headers.len()];
    let mut rows = 0usize;
    let mut first_date = None;
    let mut last_date = None;

    for record in rdr.records() {
        let record = record?;
        rows += 1;
        for (col, value) in record.iter().enumerate().take(headers.len()) {
            if is_null(value) {
                nulls[col] += 1;
            } else {
                distinct[col].insert(value.to_string());
            }
        }
        if let Some(date) = record.get(date_idx).and_then(parse_date) {
            first_date.get_or_insert(date);
            last_date = Some(date);
        }
    }

    let columns = headers
        .iter()
        .zip(nulls.iter().zip(&distinct))
        .map(|(name, (&null_count, values))| ColumnInfo {
            name: name.to_string(),
            non_null: rows - null_count,
            null_count,
            null_pct: if rows == 0 {
                0.0
            } else {
                null_count as f64 / rows as f64 * 100.0
            },
            unique_values: values.len(),
        })
        .collect();

    Ok(CsvDescription {
        rows,
        columns,
        first_date,
        last_date,
    })
}

// ─── Fingerprint ────────────────────────────────────────────────────

/// Deterministic BLAKE3 hash over every (date, level, signal) triple.
pub fn compute_dataset_hash(daily: &[DailyObservation]) -> String {
    let mut hasher = blake3::Hasher::new();
    for obs in daily {
        hasher.update(obs.date.to_string().as_bytes());
        hasher.update(&obs.index_level.to_le_bytes());
        hasher.update(&[obs.signal]);
    }
    hasher.finalize().to_hex().to_string()
}
