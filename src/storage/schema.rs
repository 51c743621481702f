//! Database schema for the SQLite archive

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per harvest run
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    entrant_count INTEGER NOT NULL DEFAULT 0
);

-- Archived entrants, in listing order within a run
CREATE TABLE IF NOT EXISTS entrants (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    position INTEGER NOT NULL,
    id INTEGER NOT NULL,
    name TEXT NOT NULL,
    cur_rank INTEGER NOT NULL,
    prev_rank INTEGER NOT NULL,
    world TEXT NOT NULL,
    dc TEXT NOT NULL,
    points INTEGER NOT NULL,
    points_delta INTEGER NOT NULL,
    portrait TEXT NOT NULL,
    tier TEXT NOT NULL,
    wins INTEGER NOT NULL,
    wins_delta INTEGER NOT NULL,
    job TEXT NOT NULL,
    PRIMARY KEY (run_id, position)
);

CREATE INDEX IF NOT EXISTS idx_entrants_id ON entrants(id);
CREATE INDEX IF NOT EXISTS idx_entrants_dc ON entrants(run_id, dc);
"#;

/// Creates any missing tables and indexes
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
