//! Append-only record sink for event tables.
//!
//! Each table is a CSV file whose first column is `timestamp`. With daily
//! rotation the file name carries the calendar day (`2024-01-02_viewer_count.csv`).

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use webcast_core::error::{FeedError, Result};

use crate::config::RecordsSection;

/// One row of an event table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub table: &'static str,
    /// Column names after `timestamp`.
    pub columns: &'static [&'static str],
    pub values: Vec<String>,
}

pub trait RecordSink: Send + Sync {
    fn append(&self, at: DateTime<Local>, record: &Record) -> Result<()>;
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn append(&self, _at: DateTime<Local>, _record: &Record) -> Result<()> {
        Ok(())
    }
}

/// Keeps rows in memory (embedding and tests).
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Record> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl RecordSink for MemorySink {
    fn append(&self, _at: DateTime<Local>, record: &Record) -> Result<()> {
        self.rows
            .lock()
            .map_err(|_| FeedError::Sink("memory sink poisoned".into()))?
            .push(record.clone());
        Ok(())
    }
}

/// CSV files under one directory.
pub struct CsvFileSink {
    dir: PathBuf,
    rotate_daily: bool,
    // Serializes "does the file exist / write header" with the append.
    write_lock: Mutex<()>,
}

impl CsvFileSink {
    pub fn new(dir: impl Into<PathBuf>, rotate_daily: bool) -> Self {
        Self {
            dir: dir.into(),
            rotate_daily,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(cfg: &RecordsSection) -> Self {
        Self::new(cfg.dir.clone(), cfg.rotate_daily)
    }

    pub fn path_for(&self, at: DateTime<Local>, table: &str) -> PathBuf {
        let name = if self.rotate_daily {
            format!("{}_{table}.csv", at.format("%Y-%m-%d"))
        } else {
            format!("{table}.csv")
        };
        self.dir.join(name)
    }
}

fn sink_err(path: &Path) -> impl Fn(std::io::Error) -> FeedError + '_ {
    move |e| FeedError::Sink(format!("{}: {e}", path.display()))
}

impl RecordSink for CsvFileSink {
    fn append(&self, at: DateTime<Local>, record: &Record) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| FeedError::Sink("csv sink poisoned".into()))?;

        std::fs::create_dir_all(&self.dir).map_err(sink_err(&self.dir))?;
        let path = self.path_for(at, record.table);
        let is_new = !path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(sink_err(&path))?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        let csv_err = |e: csv::Error| FeedError::Sink(format!("{}: {e}", path.display()));
        if is_new {
            w.write_record(std::iter::once("timestamp").chain(record.columns.iter().copied()))
                .map_err(csv_err)?;
        }
        let ts = at.format("%Y-%m-%d %H:%M:%S").to_string();
        w.write_record(std::iter::once(ts.as_str()).chain(record.values.iter().map(String::as_str)))
            .map_err(csv_err)?;
        w.flush().map_err(sink_err(&path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;

    use super::*;

    const COLUMNS: &[&str] = &["current_viewers", "total_viewers"];

    fn row(current: u64, total: u64) -> Record {
        Record {
            table: "viewer_count",
            columns: COLUMNS,
            values: vec![current.to_string(), total.to_string()],
        }
    }

    #[test]
    fn writes_header_once_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvFileSink::new(dir.path(), true);
        let at = Local.with_ymd_and_hms(2024, 1, 2, 21, 51, 0).unwrap();

        sink.append(at, &row(120, 35000)).unwrap();
        sink.append(at, &row(121, 35010)).unwrap();

        let body = std::fs::read_to_string(dir.path().join("2024-01-02_viewer_count.csv")).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "timestamp,current_viewers,total_viewers");
        assert_eq!(lines[1], "2024-01-02 21:51:00,120,35000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn segments_by_day_only_when_rotating() {
        let dir = tempfile::tempdir().unwrap();
        let day1 = Local.with_ymd_and_hms(2024, 1, 2, 23, 59, 0).unwrap();
        let day2 = Local.with_ymd_and_hms(2024, 1, 3, 0, 1, 0).unwrap();

        let rotating = CsvFileSink::new(dir.path(), true);
        assert_ne!(rotating.path_for(day1, "gift"), rotating.path_for(day2, "gift"));

        let flat = CsvFileSink::new(dir.path(), false);
        assert_eq!(flat.path_for(day1, "gift"), dir.path().join("gift.csv"));
        assert_eq!(flat.path_for(day1, "gift"), flat.path_for(day2, "gift"));
    }
}
