//! Archive backends for harvested entrant sets
//!
//! This module handles everything written at the end of a run:
//! - A daily CSV file ([`CsvArchive`])
//! - A SQLite database with one row per run ([`SqliteArchive`])
//!
//! Both implement [`Persistence`], and the coordinator only sees the trait.

mod csv_archive;
mod schema;
mod sqlite;
mod traits;

pub use csv_archive::CsvArchive;
pub use sqlite::SqliteArchive;
pub use traits::{Persistence, SaveReceipt, StorageError, StorageResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Opens the backend selected by `[output] format`
pub fn open_persistence(
    output: &OutputConfig,
    config_hash: &str,
) -> StorageResult<Box<dyn Persistence>> {
    match output.format {
        OutputFormat::Csv => Ok(Box::new(CsvArchive::new(&output.archive_dir))),
        OutputFormat::Sqlite => Ok(Box::new(SqliteArchive::open(
            Path::new(&output.database_path),
            config_hash,
        )?)),
    }
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub entrant_count: i64,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_status_roundtrip() {
        for status in [RunStatus::Running, RunStatus::Completed] {
            assert_eq!(RunStatus::from_db_string(status.to_db_string()), Some(status));
        }
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_open_persistence_picks_backend() {
        let dir = TempDir::new().unwrap();
        let mut output = OutputConfig {
            format: OutputFormat::Csv,
            archive_dir: dir.path().display().to_string(),
            database_path: dir.path().join("h.db").display().to_string(),
        };

        assert_eq!(open_persistence(&output, "x").unwrap().name(), "csv");

        output.format = OutputFormat::Sqlite;
        assert_eq!(open_persistence(&output, "x").unwrap().name(), "sqlite");
        assert!(dir.path().join("h.db").exists());
    }
}
