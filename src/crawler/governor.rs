//! Safety governor
//!
//! Decides when the crawl must stop, independently of the crawl loop:
//! wall-clock ceiling, page budget and a consecutive-failure circuit breaker.

use crate::config::CrawlerConfig;
use crate::state::{HaltReason, SharedStats};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Governor verdict for one fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No ceiling has been crossed
    Proceed,

    /// A ceiling was crossed; the crawl must halt
    Trip(HaltReason),
}

/// Budget and circuit-breaker policy
#[derive(Debug)]
pub struct Governor {
    max_wall_clock: Duration,
    max_pages: u64,
    max_consecutive_failures: u32,
    consecutive_failures: AtomicU32,
}

impl Governor {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            max_wall_clock: Duration::from_secs(config.max_wall_clock_seconds),
            max_pages: config.max_pages_visited,
            max_consecutive_failures: config.max_consecutive_failures,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Inspects the ceilings without reserving anything
    ///
    /// Workers consult this before looking for work.
    pub fn check(&self, stats: &SharedStats) -> Verdict {
        if stats.elapsed() >= self.max_wall_clock {
            return Verdict::Trip(HaltReason::WallClock);
        }

        if self.consecutive_failures.load(Ordering::SeqCst) > self.max_consecutive_failures {
            return Verdict::Trip(HaltReason::ConsecutiveFailures);
        }

        if stats.visited() >= self.max_pages {
            return Verdict::Trip(HaltReason::PageBudget);
        }

        Verdict::Proceed
    }

    /// Admits one fetch of a URL that was just marked visited
    ///
    /// On [`Verdict::Proceed`] a page-budget slot has been taken in `stats`
    /// and the caller must fetch. Slots are only taken here, so workers
    /// waiting on an empty frontier never hold budget.
    pub fn admit(&self, stats: &SharedStats) -> Verdict {
        if let Verdict::Trip(reason) = self.check(stats) {
            return Verdict::Trip(reason);
        }

        if !stats.reserve_visit(self.max_pages) {
            return Verdict::Trip(HaltReason::PageBudget);
        }

        Verdict::Proceed
    }

    /// Convenience form of [`check`](Self::check)
    pub fn proceed(&self, stats: &SharedStats) -> bool {
        self.check(stats) == Verdict::Proceed
    }

    /// Records a fetch cycle that ended without a saved person
    pub fn record_failure(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Resets the breaker after a person was saved
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Time left before the wall-clock ceiling
    pub fn remaining(&self, stats: &SharedStats) -> Duration {
        self.max_wall_clock.saturating_sub(stats.elapsed())
    }
}
