//! Process-wide crawl counters
//!
//! All counters live behind one lock. Page-budget and collection slots are
//! reserved before the work they account for, so neither `visited` nor
//! `collected` can overshoot its ceiling when many workers race.

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

/// A person page accepted into storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedPage {
    pub url: Url,
    pub title: String,
}

/// Point-in-time copy of the crawl counters
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStats {
    pub collected_count: u64,
    pub visited_count: u64,
    pub fetch_failures: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl CrawlStats {
    /// Collected pages per visited page, 0 before the first visit
    pub fn success_rate(&self) -> f64 {
        if self.visited_count == 0 {
            0.0
        } else {
            self.collected_count as f64 / self.visited_count as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    collected: u64,
    claimed: u64,
    visited: u64,
    fetch_failures: u64,
    accepted: Vec<AcceptedPage>,
}

/// Shared counters mutated by every worker
#[derive(Debug)]
pub struct SharedStats {
    counters: Mutex<Counters>,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl SharedStats {
    /// Zeroed counters; the clock starts now
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Reserves one fetch against the page budget
    ///
    /// Returns false once `max` fetches have been reserved.
    pub fn reserve_visit(&self, max: u64) -> bool {
        let mut c = self.lock();
        if c.visited >= max {
            return false;
        }
        c.visited += 1;
        true
    }

    /// Claims a collection slot below `target`
    ///
    /// A claimed slot must be settled with [`commit_collection`](Self::commit_collection)
    /// or [`release_collection`](Self::release_collection).
    pub fn claim_collection(&self, target: u64) -> bool {
        let mut c = self.lock();
        if c.collected + c.claimed >= target {
            return false;
        }
        c.claimed += 1;
        true
    }

    /// Turns a claimed slot into a collected page
    pub fn commit_collection(&self, url: &Url, title: &str) -> u64 {
        let mut c = self.lock();
        c.claimed = c.claimed.saturating_sub(1);
        c.collected += 1;
        c.accepted.push(AcceptedPage {
            url: url.clone(),
            title: title.to_string(),
        });
        c.collected
    }

    /// Gives back a claimed slot whose save did not count
    pub fn release_collection(&self) {
        let mut c = self.lock();
        c.claimed = c.claimed.saturating_sub(1);
    }

    pub fn record_fetch_failure(&self) {
        self.lock().fetch_failures += 1;
    }

    /// True once `target` pages are collected
    pub fn target_met(&self, target: u64) -> bool {
        self.lock().collected >= target
    }

    pub fn collected(&self) -> u64 {
        self.lock().collected
    }

    pub fn visited(&self) -> u64 {
        self.lock().visited
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> CrawlStats {
        let c = self.lock();
        CrawlStats {
            collected_count: c.collected,
            visited_count: c.visited,
            fetch_failures: c.fetch_failures,
            started_at: self.started_at,
            elapsed: self.started.elapsed(),
        }
    }

    /// Accepted pages in the order they were saved
    pub fn accepted(&self) -> Vec<AcceptedPage> {
        self.lock().accepted.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(name: &str) -> Url {
        Url::parse(&format!("https://pt.wikipedia.org/wiki/{}", name)).unwrap()
    }

    #[test]
    fn test_success_rate() {
        let stats = SharedStats::new();
        assert_eq!(stats.snapshot().success_rate(), 0.0);

        for _ in 0..4 {
            assert!(stats.reserve_visit(10));
        }
        assert!(stats.claim_collection(10));
        stats.commit_collection(&url("A"), "A");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.visited_count, 4);
        assert_eq!(snapshot.collected_count, 1);
        assert_eq!(snapshot.success_rate(), 0.25);
    }

    #[test]
    fn test_page_budget_reservation() {
        let stats = SharedStats::new();
        assert!(stats.reserve_visit(2));
        assert!(stats.reserve_visit(2));
        assert!(!stats.reserve_visit(2));
        assert_eq!(stats.visited(), 2);
    }

    #[test]
    fn test_collection_claims_never_exceed_target() {
        let stats = Arc::new(SharedStats::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    if stats.claim_collection(3) {
                        stats.commit_collection(&url(&i.to_string()), "x");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.collected(), 3);
        assert!(stats.target_met(3));
        assert_eq!(stats.accepted().len(), 3);
    }

    #[test]
    fn test_released_claim_frees_slot() {
        let stats = SharedStats::new();
        assert!(stats.claim_collection(1));
        assert!(!stats.claim_collection(1));
        stats.release_collection();
        assert!(stats.claim_collection(1));
        assert_eq!(stats.collected(), 0);
    }

    #[test]
    fn test_zero_target_is_met() {
        let stats = SharedStats::new();
        assert!(stats.target_met(0));
        assert!(!stats.claim_collection(0));
    }
}
