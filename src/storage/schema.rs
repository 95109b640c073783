//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Bio-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    outcome TEXT,
    collected INTEGER NOT NULL DEFAULT 0,
    visited INTEGER NOT NULL DEFAULT 0,
    success_rate REAL NOT NULL DEFAULT 0,
    elapsed_seconds REAL NOT NULL DEFAULT 0
);

-- Accepted person pages, one row per title key
CREATE TABLE IF NOT EXISTS people (
    key TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    html TEXT NOT NULL,
    saved_at TEXT NOT NULL,
    run_id INTEGER REFERENCES runs(id)
);

CREATE INDEX IF NOT EXISTS idx_people_name ON people(name);
CREATE INDEX IF NOT EXISTS idx_people_run ON people(run_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
