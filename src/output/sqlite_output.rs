//! SQLite-based stats sink
//!
//! Writes the final report into the `runs` table of the storage backend.
//! Accepted pages are already in `people`, attributed to the run by
//! [`SqliteStorage::begin_run`].

use crate::output::traits::{CrawlReport, OutputError, OutputResult, StatsSink};
use crate::storage::SqliteStorage;
use tracing::info;

impl StatsSink for SqliteStorage {
    fn persist(&self, report: &CrawlReport) -> OutputResult<()> {
        let config_hash = report.config_hash.as_deref().unwrap_or("");
        let run_id = self
            .finish_run(report.outcome, &report.stats, config_hash)
            .map_err(|e| OutputError::Storage(e.to_string()))?;

        info!(
            "Recorded run {} ({}, {} collected)",
            run_id, report.outcome, report.stats.collected_count
        );
        Ok(())
    }
}
