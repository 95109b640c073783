//! Output sink traits and types
//!
//! This module defines the trait interface for stats sinks and the final
//! crawl report they receive.

use crate::state::{AcceptedPage, CrawlOutcome, CrawlStats};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Final snapshot of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub stats: CrawlStats,
    pub target_count: u64,

    /// Accepted pages in save order
    pub accepted: Vec<AcceptedPage>,

    /// SHA-256 of the config file, when the crawl was started from one
    pub config_hash: Option<String>,

    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Fraction of visited pages that were collected
    pub fn success_rate(&self) -> f64 {
        self.stats.success_rate()
    }

    /// Whether the collected count met the target
    pub fn target_met(&self) -> bool {
        self.stats.collected_count >= self.target_count
    }
}

/// Trait for stats sinks
///
/// A sink receives the report once, when the crawl is finalized or
/// interrupted. Implementations must be thread-safe.
pub trait StatsSink: Send + Sync {
    /// Persists the final report
    ///
    /// # Arguments
    ///
    /// * `report` - The report of the finished crawl
    fn persist(&self, report: &CrawlReport) -> OutputResult<()>;
}
