//! Daily CSV archive
//!
//! One file per UTC day, `{archive_dir}/YYYY_MM_DD.csv`, with a header row
//! and one row per entrant in [`ENTRANT_COLUMNS`](crate::model::ENTRANT_COLUMNS)
//! order. A second save on the same day replaces the file.

use crate::model::Entrant;
use crate::storage::traits::{Persistence, SaveReceipt, StorageError, StorageResult};
use chrono::{NaiveDate, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvArchive {
    archive_dir: PathBuf,
}

impl CsvArchive {
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
        }
    }

    /// Path of the archive file for `date`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.archive_dir
            .join(format!("{}.csv", date.format("%Y_%m_%d")))
    }

    fn write(&self, path: &Path, entrants: &[Entrant]) -> StorageResult<()> {
        fs::create_dir_all(&self.archive_dir)?;

        let mut writer = csv::Writer::from_path(path)?;
        for entrant in entrants {
            writer.serialize(entrant)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Persistence for CsvArchive {
    fn save(&mut self, entrants: &[Entrant]) -> StorageResult<SaveReceipt> {
        if entrants.is_empty() {
            return Err(StorageError::Empty);
        }

        let path = self.path_for(Utc::now().date_naive());
        if path.exists() {
            tracing::warn!("Replacing existing archive {}", path.display());
        }

        self.write(&path, entrants)?;
        tracing::info!("Wrote {} entrants to {}", entrants.len(), path.display());

        Ok(SaveReceipt {
            location: path.display().to_string(),
            rows: entrants.len(),
        })
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
