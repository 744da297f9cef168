//! History Store
//!
//! Snapshots are persisted as one pretty-printed JSON file per analysis run
//! in `<output root>/<package>/history/`. File names embed the snapshot
//! timestamp, so sorting by file name yields chronological order.
//!
//! Records are never overwritten: a second snapshot with the same millisecond
//! timestamp is rejected. Loading is all-or-nothing; one unreadable record
//! makes [`HistoryStore::load_all`] return an empty series.

use crate::error::{PkglensError, Result};
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const RECORD_PREFIX: &str = "analysis-";
const RECORD_EXTENSION: &str = "json";

/// The file name a snapshot taken at `timestamp` is stored under.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use pkglens_core::history::record_file_name;
///
/// let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
/// assert_eq!(record_file_name(&ts), "analysis-2024-05-01T09-30-00-000Z.json");
/// ```
#[must_use]
pub fn record_file_name(timestamp: &DateTime<Utc>) -> String {
    let iso = timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
    format!(
        "{}{}.{}",
        RECORD_PREFIX,
        iso.replace([':', '.'], "-"),
        RECORD_EXTENSION
    )
}

/// Append-only store of snapshots for one package.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `snapshot` as a new record and returns its path.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created, if a record with the same
    /// timestamp already exists, or if writing fails.
    #[tracing::instrument(level = "debug", skip_all, fields(dir = %self.dir.display()), err)]
    pub fn append(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            PkglensError::io_error_with_source("create history directory", self.dir.clone(), e)
        })?;

        let path = self.dir.join(record_file_name(&snapshot.timestamp));
        let json = serde_json::to_string_pretty(snapshot)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| PkglensError::io_error_with_source("create history record", path.clone(), e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| PkglensError::io_error_with_source("write history record", path.clone(), e))?;

        tracing::info!(record = %path.display(), "saved analysis to history");
        Ok(path)
    }

    /// Loads every record in chronological order.
    ///
    /// A missing directory is an empty history. Any unreadable or malformed
    /// record discards the whole series and is logged as a warning.
    pub fn load_all(&self) -> Vec<Snapshot> {
        match self.try_load_all() {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(error = %e, dir = %self.dir.display(), "could not load history, continuing without it");
                Vec::new()
            }
        }
    }

    /// Like [`load_all`](Self::load_all) but reports the failure.
    pub fn try_load_all(&self) -> Result<Vec<Snapshot>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| {
            PkglensError::io_error_with_source("read history directory", self.dir.clone(), e)
        })?;
        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == RECORD_EXTENSION) {
                records.push(path);
            }
        }
        records.sort();

        let mut series = Vec::with_capacity(records.len());
        for path in records {
            let content = fs::read_to_string(&path).map_err(|e| {
                PkglensError::io_error_with_source("read history record", path.clone(), e)
            })?;
            let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
                PkglensError::parse_error_with_source(path.clone(), "history record is not a valid snapshot", e)
            })?;
            series.push(snapshot);
        }

        tracing::debug!(records = series.len(), "loaded history");
        Ok(series)
    }
}

/// The latest snapshot in `series` taken strictly before `current`.
pub fn previous_snapshot<'a>(series: &'a [Snapshot], current: &Snapshot) -> Option<&'a Snapshot> {
    series
        .iter()
        .filter(|s| s.timestamp < current.timestamp)
        .max_by_key(|s| s.timestamp)
}

/// `series` with `current` in place: it replaces a stored record with the
/// same timestamp, otherwise it is inserted in chronological order.
pub fn with_current(mut series: Vec<Snapshot>, current: &Snapshot) -> Vec<Snapshot> {
    match series.iter().position(|s| s.timestamp == current.timestamp) {
        Some(index) => series[index] = current.clone(),
        None => {
            let index = series.partition_point(|s| s.timestamp < current.timestamp);
            series.insert(index, current.clone());
        }
    }
    series
}

/// Numeric differences between a snapshot and its predecessor.
///
/// A field is `None` unless the quantity is present in both snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonDelta {
    pub build_time_change_ms: Option<i64>,
    pub dist_size_change: Option<i64>,
    pub dependency_count_change: Option<i64>,
}

impl ComparisonDelta {
    /// `current - previous` for every quantity known in both.
    pub fn between(current: &Snapshot, previous: &Snapshot) -> Self {
        fn diff(current: Option<u64>, previous: Option<u64>) -> Option<i64> {
            Some(signed(current?) - signed(previous?))
        }

        Self {
            build_time_change_ms: diff(current.build_duration_ms(), previous.build_duration_ms()),
            dist_size_change: diff(current.dist_total_size(), previous.dist_total_size()),
            dependency_count_change: diff(
                current.runtime_dependency_count().map(|c| c as u64),
                previous.runtime_dependency_count().map(|c| c as u64),
            ),
        }
    }

    /// True when no quantity could be compared.
    pub fn is_empty(&self) -> bool {
        self.build_time_change_ms.is_none()
            && self.dist_size_change.is_none()
            && self.dependency_count_change.is_none()
    }
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
