//! Per-run CSV log of readings
//!
//! A fresh file is created per process start with a fixed header row; one
//! row is appended per successful parse. Failed parses are not logged (the
//! skip-the-row policy; see DESIGN.md). The append is independent of the
//! in-memory history update and not transactional with it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::info;

/// Header written once at file creation
const HEADER: &str = "time,value,unit\n";

/// Append-only CSV table for one run
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Create a new run log under `dir`, named after the current wall time
    /// (`run_YYYYMMDD_HHMMSS.csv`), and write the header row.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {:?}", dir))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("run_{stamp}.csv"));
        Self::create_at(path)
    }

    /// Create a run log at an explicit path
    pub fn create_at(path: PathBuf) -> Result<Self> {
        std::fs::write(&path, HEADER)
            .with_context(|| format!("Failed to create log file {:?}", path))?;
        info!("Logging data to: {:?}", path);

        Ok(Self { path })
    }

    /// Append one reading row. Timestamps are ISO-8601.
    pub fn append(&self, timestamp: DateTime<Local>, value: f64, unit: Option<char>) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file {:?}", self.path))?;

        let unit = unit.map(String::from).unwrap_or_default();
        writeln!(file, "{},{},{}", timestamp.to_rfc3339(), value, unit)
            .context("Failed to append log row")?;

        Ok(())
    }

    /// Path of the log file for this run
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_create_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::create(dir.path()).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "time,value,unit\n");
        assert!(log
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("run_"));
    }

    #[test]
    fn test_append_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::create_at(dir.path().join("run_test.csv")).unwrap();

        let t = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        log.append(t, 22.5, Some('C')).unwrap();
        log.append(t, 23.0, None).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",22.5,C"));
        assert!(lines[2].ends_with(",23,"));
        // Timestamp column is ISO-8601
        assert!(lines[1].starts_with("2024-03-01T12:00:00"));
    }

    #[test]
    fn test_create_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("runs");
        let log = RunLog::create(&nested).unwrap();
        assert!(log.path().exists());
    }
}
