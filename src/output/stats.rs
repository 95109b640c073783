//! Console statistics
//!
//! This module prints crawl reports and stored run records to stdout.

use crate::output::traits::CrawlReport;
use crate::storage::{RunRecord, SqliteStorage};
use crate::HarvestError;

/// A stored run together with its accepted pages
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub run: RunRecord,

    /// Accepted (url, title) pairs in save order
    pub accepted: Vec<(String, String)>,
}

/// Loads the most recent run from storage
///
/// # Returns
///
/// * `Ok(Some(RunStatistics))` - The latest run
/// * `Ok(None)` - The database holds no runs
/// * `Err(HarvestError)` - Failed to query storage
pub fn load_latest_run(storage: &SqliteStorage) -> Result<Option<RunStatistics>, HarvestError> {
    let Some(run) = storage.latest_run()? else {
        return Ok(None);
    };
    let accepted = storage.accepted_in_run(run.id)?;

    Ok(Some(RunStatistics { run, accepted }))
}

/// Prints a finished crawl's report
pub fn print_report(report: &CrawlReport) {
    let stats = &report.stats;

    println!("=== Crawl Report ===\n");
    println!("Outcome: {}", report.outcome);
    println!(
        "  Collected: {} / {}",
        stats.collected_count, report.target_count
    );
    println!("  Visited: {}", stats.visited_count);
    println!("  Fetch failures: {}", stats.fetch_failures);
    println!("  Success rate: {:.1}%", report.success_rate() * 100.0);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());

    if !report.accepted.is_empty() {
        println!();
        println!("Accepted ({}):", report.accepted.len());
        for page in &report.accepted {
            println!("  - {} <{}>", page.title, page.url);
        }
    }
}

/// Prints a stored run
pub fn print_run(stats: &RunStatistics) {
    let run = &stats.run;

    println!("=== Run {} ===\n", run.id);
    println!("Started: {}", run.started_at);
    match &run.finished_at {
        Some(finished) => println!("Finished: {}", finished),
        None => println!("Finished: (in progress)"),
    }
    match run.outcome {
        Some(outcome) => println!("Outcome: {}", outcome),
        None => println!("Outcome: (none)"),
    }
    if !run.config_hash.is_empty() {
        println!("Config hash: {}", run.config_hash);
    }
    println!();

    println!("Collected: {}", run.collected);
    println!("Visited: {}", run.visited);
    println!("Success rate: {:.1}%", run.success_rate * 100.0);
    println!("Elapsed: {:.1}s", run.elapsed_seconds);

    if !stats.accepted.is_empty() {
        println!();
        println!("Accepted ({}):", stats.accepted.len());
        for (url, title) in &stats.accepted {
            println!("  - {} <{}>", title, url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CrawlOutcome, CrawlStats};
    use crate::storage::DocumentStore;
    use chrono::Utc;
    use std::time::Duration;
    use url::Url;

    #[test]
    fn test_load_latest_run_empty() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(load_latest_run(&storage).unwrap().is_none());
    }

    #[test]
    fn test_load_latest_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        storage.begin_run("h1").unwrap();
        let url = Url::parse("https://pt.wikipedia.org/wiki/Pixinguinha").unwrap();
        storage.save("Pixinguinha", &url, "<html/>").unwrap();

        let stats = CrawlStats {
            collected_count: 1,
            visited_count: 1,
            fetch_failures: 0,
            started_at: Utc::now(),
            elapsed: Duration::from_secs(1),
        };
        storage
            .finish_run(CrawlOutcome::TargetReached, &stats, "h1")
            .unwrap();

        let loaded = load_latest_run(&storage).unwrap().unwrap();
        assert_eq!(loaded.run.collected, 1);
        assert_eq!(
            loaded.accepted,
            vec![(url.to_string(), "Pixinguinha".to_string())]
        );
    }
}
