//! Shared CSV consumption loop for the movie, critic and user ingestors.
//!
//! Rows are read lazily from the file and applied to the store strictly one
//! at a time, in file order: the next record is not pulled until the current
//! row's writes have settled. A failing row is logged and skipped, including
//! rows with the wrong field count or bytes that are not UTF-8; only an I/O
//! error or an unreadable header aborts the run.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::db::Db;
use crate::normalization::RatingError;

/// Why a single row was rejected. Never fatal to the surrounding run.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("row could not be decoded: {0}")]
    Decode(String),
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has invalid value {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("movie with movieId {0} not found")]
    MovieNotFound(String),
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error("store write failed: {0}")]
    Store(#[from] sqlx::Error),
}

/// Result of applying one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Written,
    /// Row matched an existing document exactly; nothing was written.
    Unchanged,
}

/// Per-dataset tallies reported when an ingestor finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub dataset: &'static str,
    pub rows_read: u64,
    pub written: u64,
    pub unchanged: u64,
    pub skipped: u64,
}

impl IngestSummary {
    fn new(dataset: &'static str) -> Self {
        Self {
            dataset,
            ..Default::default()
        }
    }
}

/// One dataset's row transform + store write.
#[async_trait::async_trait]
pub trait RowIngestor: Send + Sync {
    type Row: DeserializeOwned + Send;

    /// Dataset label used in logs and summaries.
    fn dataset(&self) -> &'static str;

    /// Natural key of a row, for log context.
    fn row_key(&self, row: &Self::Row) -> String;

    async fn apply(&self, db: &Db, row: Self::Row) -> Result<RowOutcome, RowError>;
}

/// Stream `path` through `ingestor`, one row in flight at a time.
pub async fn ingest_csv<I: RowIngestor>(
    db: &Db,
    ingestor: &I,
    path: &Path,
) -> Result<IngestSummary> {
    let dataset = ingestor.dataset();
    let file = File::open(path)
        .with_context(|| format!("open {dataset} csv {}", path.display()))?;
    // Field counts are checked per row, so a ragged record is skipped rather than fatal.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));
    let headers = rdr
        .headers()
        .with_context(|| format!("read {dataset} csv header {}", path.display()))?
        .clone();
    info!(dataset, path = %path.display(), columns = headers.len(), "ingest started");

    let mut summary = IngestSummary::new(dataset);
    let mut raw = csv::ByteRecord::new();
    // Reads block the current worker; only one row is in flight, so nothing else waits on it.
    loop {
        let has_row = rdr
            .read_byte_record(&mut raw)
            .with_context(|| format!("read {dataset} csv {}", path.display()))?;
        if !has_row {
            break;
        }
        summary.rows_read += 1;
        let line = raw.position().map(|p| p.line()).unwrap_or_default();

        if raw.len() != headers.len() {
            let err = RowError::FieldCount {
                expected: headers.len(),
                found: raw.len(),
            };
            warn!(dataset, line, error = %err, "row skipped");
            summary.skipped += 1;
            continue;
        }
        if std::str::from_utf8(raw.as_slice()).is_err() {
            warn!(dataset, line, "row is not valid UTF-8; undecodable bytes replaced");
        }
        let record = csv::StringRecord::from_byte_record_lossy(raw.clone());

        let row: I::Row = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(err) => {
                warn!(dataset, line, error = %RowError::Decode(err.to_string()), "row skipped");
                summary.skipped += 1;
                continue;
            }
        };
        let key = ingestor.row_key(&row);
        match ingestor.apply(db, row).await {
            Ok(RowOutcome::Written) => summary.written += 1,
            Ok(RowOutcome::Unchanged) => summary.unchanged += 1,
            Err(err) => {
                warn!(dataset, line, key = %key, error = %err, "row skipped");
                summary.skipped += 1;
            }
        }
    }

    info!(
        dataset,
        rows_read = summary.rows_read,
        written = summary.written,
        unchanged = summary.unchanged,
        skipped = summary.skipped,
        "ingest finished"
    );
    Ok(summary)
}

/// Non-empty value of a required column.
pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String, RowError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(RowError::MissingField(field))
}

/// Empty cells are treated as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub(crate) fn parse_int(value: Option<String>, field: &'static str) -> Result<i64, RowError> {
    let raw = required(value, field)?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| RowError::InvalidField { field, value: raw })
}

pub(crate) fn parse_number(value: Option<String>, field: &'static str) -> Result<f64, RowError> {
    let raw = required(value, field)?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(RowError::InvalidField { field, value: raw })
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `MM/DD/YYYY`.
pub(crate) fn parse_date(value: Option<String>, field: &'static str) -> Result<NaiveDate, RowError> {
    let raw = required(value, field)?;
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(s, "%m/%d/%Y").ok())
        .ok_or(RowError::InvalidField { field, value: raw })
}

pub(crate) fn parse_enum<T: std::str::FromStr>(
    value: Option<String>,
    field: &'static str,
) -> Result<T, RowError> {
    let raw = required(value, field)?;
    raw.parse::<T>()
        .map_err(|_| RowError::InvalidField { field, value: raw })
}
