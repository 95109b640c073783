//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DocumentStore
//! trait plus the run records used for reporting.

use crate::state::{CrawlOutcome, CrawlStats};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, SaveOutcome, StorageError, StorageResult, StoredDocument};
use crate::storage::{document_key, normalize_name, RunRecord};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// SQLite storage backend
///
/// The connection sits behind a mutex so one instance can be shared by every
/// worker.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    run_id: Mutex<Option<i64>>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self::from_connection(conn))
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            run_id: Mutex::new(None),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Run Management =====

    /// Creates a run record; people saved afterwards are attributed to it
    pub fn begin_run(&self, config_hash: &str) -> StorageResult<i64> {
        let id = {
            let conn = self.conn();
            conn.execute(
                "INSERT INTO runs (started_at, config_hash) VALUES (?1, ?2)",
                params![Utc::now().to_rfc3339(), config_hash],
            )?;
            conn.last_insert_rowid()
        };

        *self.run_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        Ok(id)
    }

    /// The run begun by [`begin_run`](Self::begin_run), if any
    pub fn current_run(&self) -> Option<i64> {
        *self.run_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes the final counters of the current run
    ///
    /// When no run was begun a finished record is inserted instead.
    ///
    /// # Returns
    ///
    /// The run ID the counters were written to
    pub fn finish_run(
        &self,
        outcome: CrawlOutcome,
        stats: &CrawlStats,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let run_id = match self.current_run() {
            Some(id) => id,
            None => {
                let conn = self.conn();
                conn.execute(
                    "INSERT INTO runs (started_at, config_hash) VALUES (?1, ?2)",
                    params![stats.started_at.to_rfc3339(), config_hash],
                )?;
                conn.last_insert_rowid()
            }
        };

        let updated = self.conn().execute(
            "UPDATE runs SET finished_at = ?1, outcome = ?2, collected = ?3, visited = ?4,
                success_rate = ?5, elapsed_seconds = ?6
             WHERE id = ?7",
            params![
                Utc::now().to_rfc3339(),
                outcome.to_db_string(),
                stats.collected_count as i64,
                stats.visited_count as i64,
                stats.success_rate(),
                stats.elapsed.as_secs_f64(),
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(run_id)
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn()
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, outcome, collected, visited,
                    success_rate, elapsed_seconds
                 FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    /// Gets the most recent run
    pub fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn()
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, outcome, collected, visited,
                    success_rate, elapsed_seconds
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    /// Accepted (url, title) pairs of a run in save order
    pub fn accepted_in_run(&self, run_id: i64) -> StorageResult<Vec<(String, String)>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT url, title FROM people WHERE run_id = ?1 ORDER BY rowid")?;

        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let outcome: Option<String> = row.get(4)?;

    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        outcome: outcome.as_deref().and_then(CrawlOutcome::from_db_string),
        collected: row.get::<_, i64>(5)? as u64,
        visited: row.get::<_, i64>(6)? as u64,
        success_rate: row.get(7)?,
        elapsed_seconds: row.get(8)?,
    })
}

impl DocumentStore for SqliteStorage {
    fn save(&self, title: &str, url: &Url, html: &str) -> StorageResult<SaveOutcome> {
        let key = document_key(title)?;
        let run_id = self.current_run();

        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO people (key, title, name, url, html, saved_at, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                key,
                title,
                normalize_name(title),
                url.as_str(),
                html,
                Utc::now().to_rfc3339(),
                run_id
            ],
        )?;

        Ok(if inserted == 1 {
            SaveOutcome::Stored
        } else {
            SaveOutcome::AlreadyPresent
        })
    }

    fn contains(&self, title: &str) -> StorageResult<bool> {
        let key = document_key(title)?;
        let found = self
            .conn()
            .query_row("SELECT 1 FROM people WHERE key = ?1", params![key], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn load_documents(&self) -> StorageResult<HashMap<String, StoredDocument>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key, title, name, url, html FROM people")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(2)?,
                StoredDocument {
                    key: row.get(0)?,
                    title: row.get(1)?,
                    url: row.get(3)?,
                    html: row.get(4)?,
                },
            ))
        })?;

        let mut documents = HashMap::new();
        for row in rows {
            let (name, document) = row?;
            documents.insert(name, document);
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn url(name: &str) -> Url {
        Url::parse(&format!("https://pt.wikipedia.org/wiki/{}", name)).unwrap()
    }

    fn stats(collected: u64, visited: u64) -> CrawlStats {
        CrawlStats {
            collected_count: collected,
            visited_count: visited,
            fetch_failures: 0,
            started_at: Utc::now(),
            elapsed: Duration::from_secs(12),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert_eq!(storage.count().unwrap(), 0);
        assert!(storage.latest_run().unwrap().is_none());
    }

    #[test]
    fn test_save_is_idempotent() {
        let storage = SqliteStorage::new_in_memory().unwrap();

        let first = storage.save("Gal Costa", &url("Gal_Costa"), "<html>1</html>").unwrap();
        let second = storage.save("Gal Costa", &url("Gal_Costa"), "<html>2</html>").unwrap();

        assert_eq!(first, SaveOutcome::Stored);
        assert_eq!(second, SaveOutcome::AlreadyPresent);
        assert_eq!(storage.count().unwrap(), 1);
        assert!(storage.contains("Gal Costa").unwrap());

        let docs = storage.load_documents().unwrap();
        assert_eq!(docs["gal costa"].html, "<html>1</html>");
    }

    #[test]
    fn test_titles_sharing_a_key_collide() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        storage.save("AC/DC", &url("AC/DC"), "a").unwrap();
        let outcome = storage.save("AC:DC", &url("AC:DC"), "b").unwrap();
        assert_eq!(outcome, SaveOutcome::AlreadyPresent);
    }

    #[test]
    fn test_invalid_title_is_an_error() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.save("", &url("x"), "x"),
            Err(StorageError::InvalidTitle(_))
        ));
    }

    #[test]
    fn test_run_lifecycle() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.begin_run("abc123").unwrap();

        storage.save("Zico", &url("Zico"), "z").unwrap();
        storage.save("Sócrates", &url("S%C3%B3crates"), "s").unwrap();

        let finished = storage
            .finish_run(CrawlOutcome::TargetReached, &stats(2, 8), "abc123")
            .unwrap();
        assert_eq!(finished, run_id);

        let run = storage.latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.outcome, Some(CrawlOutcome::TargetReached));
        assert_eq!(run.collected, 2);
        assert_eq!(run.visited, 8);
        assert_eq!(run.success_rate, 0.25);
        assert!(run.finished_at.is_some());

        let accepted = storage.accepted_in_run(run_id).unwrap();
        let titles: Vec<&str> = accepted.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(titles, vec!["Zico", "Sócrates"]);
    }

    #[test]
    fn test_finish_without_begin_inserts_record() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage
            .finish_run(CrawlOutcome::Interrupted, &stats(0, 3), "h")
            .unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.outcome, Some(CrawlOutcome::Interrupted));
        assert_eq!(run.config_hash, "h");
    }

    #[test]
    fn test_missing_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(storage.get_run(42), Err(StorageError::RunNotFound(42))));
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.db");

        {
            let storage = SqliteStorage::new(&path).unwrap();
            storage.save("Tom Jobim", &url("Tom_Jobim"), "t").unwrap();
        }

        let reopened = SqliteStorage::new(&path).unwrap();
        assert!(reopened.contains("Tom Jobim").unwrap());
    }
}
