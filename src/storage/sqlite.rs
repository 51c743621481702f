//! SQLite archive
//!
//! Opening the archive records a `running` row in `runs`; a successful save
//! inserts every entrant in one transaction and marks the run `completed`.
//! A run that gathered nothing is marked `completed` with no entrants.

use crate::model::Entrant;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Persistence, SaveReceipt, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite archive backend
pub struct SqliteArchive {
    conn: Connection,
    location: String,
    run_id: i64,
}

impl SqliteArchive {
    /// Opens (or creates) the database at `path` and starts a run
    pub fn open(path: &Path, config_hash: &str) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        Self::start(conn, path.to_path_buf(), config_hash)
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory(config_hash: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::start(conn, PathBuf::from(":memory:"), config_hash)
    }

    fn start(conn: Connection, path: PathBuf, config_hash: &str) -> StorageResult<Self> {
        initialize_schema(&conn)?;

        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![
                Utc::now().to_rfc3339(),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        let run_id = conn.last_insert_rowid();
        tracing::debug!("Started run {} in {}", run_id, path.display());

        Ok(Self {
            conn,
            location: path.display().to_string(),
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, entrant_count
                 FROM runs WHERE id = ?1",
                params![run_id],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        config_hash: row.get(3)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                            .unwrap_or(RunStatus::Running),
                        entrant_count: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(run)
    }

    /// Counts the entrants archived for `run_id`
    pub fn count_entrants(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entrants WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl Persistence for SqliteArchive {
    fn save(&mut self, entrants: &[Entrant]) -> StorageResult<SaveReceipt> {
        if entrants.is_empty() {
            return Err(StorageError::Empty);
        }

        let id_to_sql = |id: u64| {
            i64::try_from(id).map_err(|_| StorageError::Database(format!("id {} out of range", id)))
        };

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entrants (run_id, position, id, name, cur_rank, prev_rank, world, dc,
                                       points, points_delta, portrait, tier, wins, wins_delta, job)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;

            for (position, e) in entrants.iter().enumerate() {
                stmt.execute(params![
                    self.run_id,
                    position as i64,
                    id_to_sql(e.id)?,
                    e.name,
                    e.current_rank,
                    e.previous_rank,
                    e.world,
                    e.group,
                    e.points,
                    e.points_delta,
                    e.portrait,
                    e.tier,
                    e.wins,
                    e.wins_delta,
                    e.category.code(),
                ])?;
            }
        }

        tx.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, entrant_count = ?3 WHERE id = ?4",
            params![
                RunStatus::Completed.to_db_string(),
                Utc::now().to_rfc3339(),
                entrants.len() as i64,
                self.run_id
            ],
        )?;
        tx.commit()?;

        tracing::info!(
            "Archived {} entrants as run {} in {}",
            entrants.len(),
            self.run_id,
            self.location
        );

        Ok(SaveReceipt {
            location: format!("{}#{}", self.location, self.run_id),
            rows: entrants.len(),
        })
    }

    fn record_empty_run(&mut self) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, entrant_count = 0 WHERE id = ?3",
            params![
                RunStatus::Completed.to_db_string(),
                Utc::now().to_rfc3339(),
                self.run_id
            ],
        )?;
        tracing::info!("Run {} finished with no entrants", self.run_id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
