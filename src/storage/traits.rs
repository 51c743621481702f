//! Persistence trait and error types

use crate::model::Entrant;
use thiserror::Error;

/// Errors that can occur while archiving a run
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Refusing to archive an empty entrant set")]
    Empty,

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Where a save landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// File path or `path#run-id` of the archived set
    pub location: String,
    pub rows: usize,
}

/// Archive backend for the final entrant set
///
/// `save` is called at most once per run with the complete, ordered set.
pub trait Persistence: Send {
    /// Writes every entrant, in order
    ///
    /// Empty input is rejected with [`StorageError::Empty`].
    fn save(&mut self, entrants: &[Entrant]) -> StorageResult<SaveReceipt>;

    /// Closes out a run that produced nothing to save
    fn record_empty_run(&mut self) -> StorageResult<()> {
        Ok(())
    }

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
