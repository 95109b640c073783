//! Crawl coordinator - main crawl orchestration logic
//!
//! This module runs one crawl:
//! - Seeding the frontier and spawning the worker pool
//! - Driving each worker's fetch, classify and expand cycle
//! - Recording the first stop reason and draining the workers
//! - Finalizing exactly once, including on interruption

use crate::classifier::Classifier;
use crate::config::{validate, Config};
use crate::crawler::fetcher::FetchClient;
use crate::crawler::frontier::{Frontier, Pop};
use crate::crawler::governor::{Governor, Verdict};
use crate::crawler::target::CrawlTarget;
use crate::identity::IdentityPool;
use crate::links::LinkExtractor;
use crate::output::{CrawlReport, StatsSink};
use crate::robots::RobotsGate;
use crate::state::{CrawlOutcome, CrawlPhase, HaltReason, PhaseTracker, SharedStats};
use crate::storage::{DocumentStore, SaveOutcome};
use crate::url::normalize_url;
use crate::HarvestError;
use chrono::Utc;
use scraper::Html;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Visited pages between progress lines
const PROGRESS_EVERY: u64 = 10;

/// Main crawler coordinator structure
///
/// Holds the configuration and the collaborators a run writes to. Each call
/// to [`run`](Coordinator::run) is an independent crawl with fresh counters.
pub struct Coordinator {
    config: Arc<Config>,
    store: Arc<dyn DocumentStore>,
    sinks: Vec<Arc<dyn StatsSink>>,
    config_hash: Option<String>,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - Where accepted person pages are saved
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            sinks: Vec::new(),
            config_hash: None,
        }
    }

    /// Adds a sink that receives the final report
    pub fn with_sink(mut self, sink: Arc<dyn StatsSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Records the config file hash in the report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the crawl until a stop condition or `cancel` fires
    ///
    /// Configuration problems are returned before any worker starts. Once
    /// workers have started the run always finalizes and returns its report;
    /// cancelling `cancel` yields [`CrawlOutcome::Interrupted`] unless another
    /// stop reason was recorded first.
    pub async fn run(&self, cancel: CancellationToken) -> Result<CrawlReport, HarvestError> {
        validate(&self.config)?;

        let seeds = self
            .config
            .crawler
            .seeds
            .iter()
            .map(|seed| normalize_url(seed).map(CrawlTarget::seed))
            .collect::<Result<Vec<_>, _>>()?;

        let run = Arc::new(CrawlRun::build(
            Arc::clone(&self.config),
            Arc::clone(&self.store),
            cancel.child_token(),
        )?);
        let phase = PhaseTracker::new();

        info!(
            "Starting crawl: target {}, {} worker(s), {} seed(s)",
            self.config.crawler.target_count,
            self.config.crawler.worker_count,
            seeds.len()
        );

        let enqueued = run.frontier.extend(seeds);
        debug!("Seeded frontier with {} target(s)", enqueued);

        if run.target_met() {
            run.stop_with(CrawlOutcome::TargetReached);
        } else if !cancel.is_cancelled() {
            phase.advance(CrawlPhase::Running)?;
            run_workers(&run).await;
        }

        let outcome = run.outcome().unwrap_or(CrawlOutcome::Interrupted);
        if let Some(stopping) = outcome.phase() {
            phase.advance(stopping)?;
        }

        let report = run
            .finalize(outcome, self.config_hash.clone(), &self.sinks)
            .ok_or_else(|| HarvestError::Worker("crawl finalized twice".to_string()))?;
        phase.advance(CrawlPhase::Finalized)?;

        info!(
            "Crawl finished ({}): {} collected, {} visited in {:.1}s, {} target(s) shed from a full frontier",
            report.outcome,
            report.stats.collected_count,
            report.stats.visited_count,
            report.stats.elapsed.as_secs_f64(),
            run.frontier.dropped()
        );

        Ok(report)
    }
}

/// Spawns the worker pool and waits for every worker to exit
async fn run_workers(run: &Arc<CrawlRun>) {
    let mut workers = JoinSet::new();
    for id in 0..run.config.crawler.worker_count {
        let run = Arc::clone(run);
        workers.spawn(async move { run.worker(id).await });
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            error!("Worker task failed: {}", e);
        }
    }
}

/// State shared by the workers of one run
struct CrawlRun {
    config: Arc<Config>,
    store: Arc<dyn DocumentStore>,
    fetcher: FetchClient,
    robots: Option<RobotsGate>,
    classifier: Classifier,
    links: LinkExtractor,
    frontier: Frontier,
    governor: Governor,
    stats: SharedStats,

    /// Cancelled by the first stop reason or by the caller's token
    stop: CancellationToken,
    outcome: Mutex<Option<CrawlOutcome>>,
    finalized: AtomicBool,
}

impl CrawlRun {
    fn build(
        config: Arc<Config>,
        store: Arc<dyn DocumentStore>,
        stop: CancellationToken,
    ) -> Result<Self, HarvestError> {
        let identities = Arc::new(IdentityPool::from_entries(&config.identities));
        let fetcher = FetchClient::new(&config.fetch, identities)?;
        let robots = config
            .crawler
            .respect_robots_txt
            .then(|| RobotsGate::new(fetcher.client().clone()));

        Ok(Self {
            classifier: Classifier::new(&config.classifier)?,
            links: LinkExtractor::new(&config.links)?,
            frontier: Frontier::new(config.crawler.max_frontier_size),
            governor: Governor::new(&config.crawler),
            stats: SharedStats::new(),
            fetcher,
            robots,
            store,
            config,
            stop,
            outcome: Mutex::new(None),
            finalized: AtomicBool::new(false),
        })
    }

    fn target_count(&self) -> u64 {
        self.config.crawler.target_count
    }

    fn target_met(&self) -> bool {
        self.stats.target_met(self.target_count())
    }

    fn outcome(&self) -> Option<CrawlOutcome> {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the stop reason unless one was already recorded, then stops
    /// every worker at its next cycle boundary
    fn stop_with(&self, outcome: CrawlOutcome) {
        {
            let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                info!("Stopping crawl: {}", outcome);
                *slot = Some(outcome);
            }
        }
        self.stop.cancel();
        self.frontier.wake_all();
    }

    fn halt(&self, reason: HaltReason) {
        warn!("Governor tripped: {}", reason);
        self.stop_with(CrawlOutcome::Halted(reason));
    }

    /// One worker's loop
    ///
    /// Cancellation is only observed between cycles; a fetch in progress is
    /// never aborted.
    async fn worker(&self, id: u32) {
        debug!("Worker {} started", id);

        loop {
            if self.stop.is_cancelled() {
                break;
            }

            if let Verdict::Trip(reason) = self.governor.check(&self.stats) {
                self.halt(reason);
                break;
            }

            let target = match self.frontier.pop() {
                Pop::Target(target) => target,
                Pop::Idle => {
                    tokio::select! {
                        _ = self.stop.cancelled() => break,
                        _ = self.frontier.wait_for_work() => continue,
                    }
                }
                Pop::Exhausted => {
                    self.stop_with(CrawlOutcome::FrontierExhausted);
                    break;
                }
            };

            self.process(target).await;
        }

        debug!("Worker {} stopped", id);
    }

    /// Fetches, classifies and expands one target, then settles its
    /// frontier and budget bookkeeping
    async fn process(&self, target: CrawlTarget) {
        if !self.allowed_by_robots(&target).await || !self.frontier.mark_visited(&target.url) {
            self.frontier.complete();
            return;
        }

        if let Verdict::Trip(reason) = self.governor.admit(&self.stats) {
            self.halt(reason);
            self.frontier.complete();
            return;
        }

        let budget = self.governor.remaining(&self.stats);
        if self.visit(&target, budget).await {
            self.governor.record_success();
        } else {
            let failures = self.governor.record_failure();
            debug!("{} cycle(s) without a saved person", failures);
        }

        self.frontier.complete();
        self.log_progress();

        if self.target_met() {
            self.stop_with(CrawlOutcome::TargetReached);
        }
    }

    async fn allowed_by_robots(&self, target: &CrawlTarget) -> bool {
        let Some(robots) = &self.robots else {
            return true;
        };

        let allowed = robots.is_allowed(&target.url).await;
        if !allowed {
            debug!("Disallowed by robots.txt: {}", target.url);
        }
        allowed
    }

    /// Returns true when the visit saved a person
    ///
    /// Retries of the fetch stop once they would run past `budget`.
    async fn visit(&self, target: &CrawlTarget, budget: Duration) -> bool {
        let page = match self.fetcher.fetch(&target.url, budget).await {
            Ok(page) => page,
            Err(failure) => {
                warn!("{}", failure);
                self.stats.record_fetch_failure();
                return false;
            }
        };

        // The parsed document must not live across an await.
        let (verdict, links) = {
            let document = Html::parse_document(&page.body);
            let verdict = self.classifier.classify(&document, &page.final_url);
            let links = if self.target_met() {
                Vec::new()
            } else {
                self.links.extract_links(&document, &page.final_url)
            };
            (verdict, links)
        };

        let saved = if verdict.is_person {
            self.save_person(
                target,
                &verdict.canonical_title,
                &page.body,
                verdict.decisive_signal.as_str(),
            )
        } else {
            debug!("Not a person: {} ({:?})", target.url, verdict.rejection);
            false
        };

        if !links.is_empty() && !self.target_met() {
            let found = links.len();
            let enqueued = self.frontier.extend(links);
            debug!("{}: {} link(s), {} new", target.url, found, enqueued);
        }

        saved
    }

    /// Saves an accepted page if a collection slot is still free
    fn save_person(&self, target: &CrawlTarget, title: &str, html: &str, signal: &str) -> bool {
        if !self.stats.claim_collection(self.target_count()) {
            debug!("Target reached; not saving {}", title);
            return false;
        }

        match self.store.save(title, &target.url, html) {
            Ok(SaveOutcome::Stored) => {
                let collected = self.stats.commit_collection(&target.url, title);
                info!(
                    "Saved person {} ({}/{}) via {}",
                    title,
                    collected,
                    self.target_count(),
                    signal
                );
                true
            }
            Ok(SaveOutcome::AlreadyPresent) => {
                self.stats.release_collection();
                debug!("{} is already stored", title);
                false
            }
            Err(e) => {
                self.stats.release_collection();
                error!("Failed to store {}: {}", title, e);
                false
            }
        }
    }

    fn log_progress(&self) {
        let stats = self.stats.snapshot();
        if stats.visited_count == 0 || stats.visited_count % PROGRESS_EVERY != 0 {
            return;
        }

        info!(
            "Progress: {}/{} collected, {} visited, {} in frontier ({} shed), {:.1}% success",
            stats.collected_count,
            self.target_count(),
            stats.visited_count,
            self.frontier.len(),
            self.frontier.dropped(),
            stats.success_rate() * 100.0
        );
    }

    /// Builds the report and hands it to every sink
    ///
    /// Returns None if the run was already finalized.
    fn finalize(
        &self,
        outcome: CrawlOutcome,
        config_hash: Option<String>,
        sinks: &[Arc<dyn StatsSink>],
    ) -> Option<CrawlReport> {
        if self.finalized.swap(true, Ordering::SeqCst) {
            return None;
        }

        let report = CrawlReport {
            outcome,
            stats: self.stats.snapshot(),
            target_count: self.target_count(),
            accepted: self.stats.accepted(),
            config_hash,
            finished_at: Utc::now(),
        };

        for sink in sinks {
            if let Err(e) = sink.persist(&report) {
                error!("Failed to persist crawl report: {}", e);
            }
        }

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ClassifierConfig, CrawlerConfig, DelayRange, FetchConfig, LinkConfig, OutputConfig,
    };
    use crate::output::OutputResult;
    use crate::storage::MemoryStore;

    fn config(target_count: u64, seeds: Vec<String>) -> Config {
        Config {
            crawler: CrawlerConfig {
                target_count,
                max_pages_visited: 10,
                max_wall_clock_seconds: 30,
                worker_count: 2,
                max_consecutive_failures: 5,
                max_frontier_size: None,
                respect_robots_txt: false,
                seeds,
            },
            fetch: FetchConfig {
                request_timeout_seconds: 1,
                retry_max_attempts: 1,
                inter_request_delay: DelayRange::ZERO,
                transport_backoff: DelayRange::ZERO,
                block_backoff: DelayRange::ZERO,
                rate_limit_backoff: DelayRange::ZERO,
                rotate_identity_on_block: true,
            },
            identities: Vec::new(),
            classifier: ClassifierConfig::default(),
            links: LinkConfig::default(),
            output: OutputConfig {
                database_path: "unused.db".to_string(),
                summary_path: "unused.md".to_string(),
            },
        }
    }

    #[derive(Default)]
    struct CountingSink {
        calls: Mutex<Vec<CrawlOutcome>>,
    }

    impl StatsSink for CountingSink {
        fn persist(&self, report: &CrawlReport) -> OutputResult<()> {
            self.calls.lock().unwrap().push(report.outcome);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_target_zero_finishes_without_fetching() {
        // Nothing listens on port 1, so any fetch would fail.
        let config = config(0, vec!["http://127.0.0.1:1/wiki/Zico".to_string()]);
        let sink = Arc::new(CountingSink::default());
        let coordinator =
            Coordinator::new(config, Arc::new(MemoryStore::new())).with_sink(sink.clone());

        let report = coordinator.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.outcome, CrawlOutcome::TargetReached);
        assert_eq!(report.stats.visited_count, 0);
        assert_eq!(report.stats.fetch_failures, 0);
        assert_eq!(*sink.calls.lock().unwrap(), vec![CrawlOutcome::TargetReached]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_is_interrupted() {
        let config = config(5, vec!["http://127.0.0.1:1/wiki/Zico".to_string()]);
        let sink = Arc::new(CountingSink::default());
        let coordinator =
            Coordinator::new(config, Arc::new(MemoryStore::new())).with_sink(sink.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = coordinator.run(cancel).await.unwrap();

        assert_eq!(report.outcome, CrawlOutcome::Interrupted);
        assert_eq!(report.stats.visited_count, 0);
        assert_eq!(sink.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_seed_exhausts_frontier() {
        let config = config(5, vec!["http://127.0.0.1:1/wiki/Zico".to_string()]);
        let coordinator = Coordinator::new(config, Arc::new(MemoryStore::new()));

        let report = coordinator.run(CancellationToken::new()).await.unwrap();

        assert_eq!(report.outcome, CrawlOutcome::FrontierExhausted);
        assert_eq!(report.stats.visited_count, 1);
        assert_eq!(report.stats.fetch_failures, 1);
        assert_eq!(report.stats.collected_count, 0);
    }

    #[tokio::test]
    async fn test_empty_seed_set_is_fatal() {
        let coordinator = Coordinator::new(config(5, Vec::new()), Arc::new(MemoryStore::new()));

        let result = coordinator.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(HarvestError::Config(_))));
    }

    #[tokio::test]
    async fn test_config_hash_is_reported() {
        let config = config(0, vec!["http://127.0.0.1:1/".to_string()]);
        let coordinator =
            Coordinator::new(config, Arc::new(MemoryStore::new())).with_config_hash("deadbeef");

        let report = coordinator.run(CancellationToken::new()).await.unwrap();
        assert_eq!(report.config_hash.as_deref(), Some("deadbeef"));
    }
}
