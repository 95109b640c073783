//! Crawler module for page fetching and crawl coordination
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with identity rotation and retry/backoff
//! - The deduplicated, priority-tiered frontier
//! - The safety governor (time, page and failure budgets)
//! - Overall crawl coordination across the worker pool

mod coordinator;
mod fetcher;
mod frontier;
mod governor;
mod retry;
mod target;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchClient, FetchFailure, FetchedPage};
pub use frontier::{Frontier, Pop, VisitedSet};
pub use governor::{Governor, Verdict};
pub use retry::{FailureKind, RetryDecision, RetryPolicy};
pub use target::{CrawlTarget, OriginContext, Priority};

pub use crate::state::CrawlOutcome;

use crate::config::Config;
use crate::output::CrawlReport;
use crate::storage::DocumentStore;
use crate::HarvestError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl with no stats sinks
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `store` - Where accepted person pages are saved
/// * `cancel` - Cancelling this token interrupts the crawl
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl finished, for whatever reason
/// * `Err(HarvestError)` - The configuration was unusable
pub async fn crawl(
    config: Config,
    store: Arc<dyn DocumentStore>,
    cancel: CancellationToken,
) -> Result<CrawlReport, HarvestError> {
    Coordinator::new(config, store).run(cancel).await
}
