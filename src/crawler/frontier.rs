//! Crawl frontier and visited set
//!
//! The frontier is the authority on whether a URL has been scheduled. It
//! holds two FIFO tiers (high before normal) behind one lock, and a separate
//! [`VisitedSet`] behind its own lock. No method holds both locks at once.

use super::target::{CrawlTarget, Priority};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::trace;
use url::Url;

/// Upper bound on how long an idle worker sleeps before re-polling
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Set of normalized URLs that have been claimed for fetching
///
/// Membership check and insertion happen in one critical section, so two
/// workers can never both claim the same URL.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<Url>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL visited; returns false if it already was
    pub fn insert(&self, url: &Url) -> bool {
        lock(&self.urls).insert(url.clone())
    }

    pub fn contains(&self, url: &Url) -> bool {
        lock(&self.urls).contains(url)
    }

    pub fn len(&self) -> usize {
        lock(&self.urls).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a pop attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pop {
    /// A target to process; the caller must call [`Frontier::complete`] when
    /// done with it
    Target(CrawlTarget),

    /// Queues are empty but other workers may still add targets
    Idle,

    /// Queues are empty and no target is in flight
    Exhausted,
}

#[derive(Debug, Default)]
struct Queues {
    high: VecDeque<CrawlTarget>,
    normal: VecDeque<CrawlTarget>,
    pending: HashSet<Url>,
    in_flight: usize,
    dropped: u64,
}

impl Queues {
    fn len(&self) -> usize {
        self.high.len() + self.normal.len()
    }

    fn tier(&mut self, priority: Priority) -> &mut VecDeque<CrawlTarget> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Normal => &mut self.normal,
        }
    }

    /// Makes room for `incoming` in a full frontier
    ///
    /// Drops the oldest normal target; when the normal tier is empty a normal
    /// target is refused and a high target displaces the oldest high one.
    fn shed_for(&mut self, incoming: Priority) -> bool {
        let victim = match (self.normal.is_empty(), incoming) {
            (false, _) => self.normal.pop_front(),
            (true, Priority::Normal) => return false,
            (true, Priority::High) => self.high.pop_front(),
        };

        if let Some(target) = victim {
            trace!("Frontier full, dropping {}", target.url);
            self.pending.remove(&target.url);
            self.dropped += 1;
        }
        true
    }
}

/// Deduplicated, priority-tiered queue of pending targets
#[derive(Debug)]
pub struct Frontier {
    queues: Mutex<Queues>,
    visited: VisitedSet,
    notify: Notify,
    max_size: Option<usize>,
}

impl Frontier {
    /// Creates an empty frontier, optionally bounded
    pub fn new(max_size: Option<usize>) -> Self {
        Self {
            queues: Mutex::new(Queues::default()),
            visited: VisitedSet::new(),
            notify: Notify::new(),
            max_size,
        }
    }

    /// Enqueues a target unless its URL is already visited or pending
    ///
    /// # Returns
    ///
    /// `true` when the target was enqueued
    pub fn push(&self, target: CrawlTarget) -> bool {
        if self.visited.contains(&target.url) {
            return false;
        }

        let enqueued = {
            let mut queues = lock(&self.queues);

            if queues.pending.contains(&target.url) {
                false
            } else if self.max_size.is_some_and(|max| queues.len() >= max)
                && !queues.shed_for(target.priority)
            {
                false
            } else {
                trace!("Enqueued {}", target);
                queues.pending.insert(target.url.clone());
                queues.tier(target.priority).push_back(target);
                true
            }
        };

        if enqueued {
            self.notify.notify_waiters();
        }
        enqueued
    }

    /// Enqueues every target in order, returning how many were accepted
    pub fn extend(&self, targets: impl IntoIterator<Item = CrawlTarget>) -> usize {
        targets
            .into_iter()
            .map(|target| self.push(target))
            .filter(|enqueued| *enqueued)
            .count()
    }

    /// Pops the oldest target of the highest non-empty tier
    ///
    /// The popped target counts as in flight until [`complete`](Self::complete)
    /// is called, so the frontier is not reported exhausted while a worker may
    /// still add links.
    pub fn pop(&self) -> Pop {
        let mut queues = lock(&self.queues);

        let next = match queues.high.pop_front() {
            Some(target) => Some(target),
            None => queues.normal.pop_front(),
        };

        match next {
            Some(target) => {
                queues.pending.remove(&target.url);
                queues.in_flight += 1;
                Pop::Target(target)
            }
            None if queues.in_flight == 0 => Pop::Exhausted,
            None => Pop::Idle,
        }
    }

    /// Marks a popped target as fully processed
    pub fn complete(&self) {
        let exhausted = {
            let mut queues = lock(&self.queues);
            queues.in_flight = queues.in_flight.saturating_sub(1);
            queues.in_flight == 0 && queues.len() == 0
        };

        if exhausted {
            self.notify.notify_waiters();
        }
    }

    /// Atomically claims a URL for fetching; false if already visited
    pub fn mark_visited(&self, url: &Url) -> bool {
        self.visited.insert(url)
    }

    /// Waits until a target is pushed or the last in-flight target completes
    pub async fn wait_for_work(&self) {
        let _ = tokio::time::timeout(IDLE_POLL, self.notify.notified()).await;
    }

    /// Wakes every idle worker, used when the crawl is stopping
    pub fn wake_all(&self) {
        self.notify.notify_waiters();
    }

    /// Number of pending targets
    pub fn len(&self) -> usize {
        lock(&self.queues).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of URLs claimed for fetching
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of targets shed because the frontier was full
    pub fn dropped(&self) -> u64 {
        lock(&self.queues).dropped
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
