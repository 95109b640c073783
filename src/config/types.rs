use serde::Deserialize;

/// Main configuration structure for Bio-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default, rename = "identity")]
    pub identities: Vec<IdentityEntry>,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub links: LinkConfig,
    pub output: OutputConfig,
}

/// Crawl budgets, worker pool and seeds
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of person pages to collect before draining
    #[serde(default = "default_target_count")]
    pub target_count: u64,

    /// Page budget: no more fetches than this are issued
    #[serde(default = "default_max_pages_visited")]
    pub max_pages_visited: u64,

    /// Wall-clock budget for the whole run
    #[serde(default = "default_max_wall_clock_seconds")]
    pub max_wall_clock_seconds: u64,

    /// Number of concurrent workers pulling from the frontier
    #[serde(default = "default_worker_count")]
    pub worker_count: u32,

    /// Circuit breaker: halt once more than this many cycles in a row end without a saved person
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Optional frontier bound; when full, the oldest normal-priority target is dropped
    #[serde(default)]
    pub max_frontier_size: Option<usize>,

    /// Whether robots.txt is consulted before fetching
    #[serde(default = "default_true")]
    pub respect_robots_txt: bool,

    /// Starting URLs, enqueued at high priority in this order
    pub seeds: Vec<String>,
}

/// Fetch client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Total attempts per URL, including the first one
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Jitter applied before every request
    #[serde(default = "default_inter_request_delay")]
    pub inter_request_delay: DelayRange,

    /// Backoff after transport errors and unexpected statuses
    #[serde(default = "default_transport_backoff")]
    pub transport_backoff: DelayRange,

    /// Backoff after HTTP 403
    #[serde(default = "default_block_backoff")]
    pub block_backoff: DelayRange,

    /// Backoff after HTTP 429; must be strictly larger than the block window
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff: DelayRange,

    /// Switch to the next identity before retrying a 403
    #[serde(default = "default_true")]
    pub rotate_identity_on_block: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout_seconds(),
            retry_max_attempts: default_retry_max_attempts(),
            inter_request_delay: default_inter_request_delay(),
            transport_backoff: default_transport_backoff(),
            block_backoff: default_block_backoff(),
            rate_limit_backoff: default_rate_limit_backoff(),
            rotate_identity_on_block: true,
        }
    }
}

/// A closed range of seconds a delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange { min: 0.0, max: 0.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// One outbound header set
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IdentityEntry {
    pub user_agent: String,

    #[serde(default)]
    pub accept_language: Option<String>,
}

/// Classifier thresholds and optional signal-list overrides
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassifierConfig {
    /// Affirming panel score at or above which a page is a person
    #[serde(default = "default_affirming_threshold")]
    pub affirming_threshold: f32,

    /// Characters of opening prose inspected by the prose stage
    #[serde(default = "default_prose_window")]
    pub prose_window: usize,

    /// Independent full-date mentions in opening prose that count as a signal
    #[serde(default = "default_min_date_mentions")]
    pub min_date_mentions: usize,

    #[serde(default)]
    pub title_exclusions: Option<Vec<String>>,

    #[serde(default)]
    pub affirming_fields: Option<Vec<String>>,

    #[serde(default)]
    pub weak_affirming_fields: Option<Vec<String>>,

    #[serde(default)]
    pub negating_fields: Option<Vec<String>>,

    #[serde(default)]
    pub professions: Option<Vec<String>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            affirming_threshold: default_affirming_threshold(),
            prose_window: default_prose_window(),
            min_date_mentions: default_min_date_mentions(),
            title_exclusions: None,
            affirming_fields: None,
            weak_affirming_fields: None,
            negating_fields: None,
            professions: None,
        }
    }
}

/// Link extraction policy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LinkConfig {
    /// Path fragments that mark a listing/category page
    #[serde(default = "default_listing_markers")]
    pub listing_markers: Vec<String>,

    /// Path prefix shared by all content pages
    #[serde(default = "default_content_prefix")]
    pub content_prefix: String,

    /// Maximum links harvested from one listing page
    #[serde(default = "default_listing_link_cap")]
    pub listing_link_cap: usize,

    /// Maximum links harvested from one prose page
    #[serde(default = "default_prose_link_cap")]
    pub prose_link_cap: usize,

    /// Maximum paragraphs/list items inspected on a prose page
    #[serde(default = "default_prose_region_limit")]
    pub prose_region_limit: usize,

    #[serde(default)]
    pub trigger_words: Option<Vec<String>>,

    /// Regular expressions matched against the decoded page name
    #[serde(default)]
    pub url_denylist: Option<Vec<String>>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            listing_markers: default_listing_markers(),
            content_prefix: default_content_prefix(),
            listing_link_cap: default_listing_link_cap(),
            prose_link_cap: default_prose_link_cap(),
            prose_region_limit: default_prose_region_limit(),
            trigger_words: None,
            url_denylist: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database holding people and run records
    pub database_path: String,

    /// Path to the markdown report written at finalization
    pub summary_path: String,
}

fn default_true() -> bool {
    true
}

fn default_target_count() -> u64 {
    1000
}

fn default_max_pages_visited() -> u64 {
    3000
}

fn default_max_wall_clock_seconds() -> u64 {
    3600
}

fn default_worker_count() -> u32 {
    1
}

fn default_max_consecutive_failures() -> u32 {
    20
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_inter_request_delay() -> DelayRange {
    DelayRange::new(0.5, 1.5)
}

fn default_transport_backoff() -> DelayRange {
    DelayRange::new(1.0, 3.0)
}

fn default_block_backoff() -> DelayRange {
    DelayRange::new(5.0, 10.0)
}

fn default_rate_limit_backoff() -> DelayRange {
    DelayRange::new(10.0, 20.0)
}

fn default_affirming_threshold() -> f32 {
    2.0
}

fn default_prose_window() -> usize {
    400
}

fn default_min_date_mentions() -> usize {
    2
}

fn default_listing_markers() -> Vec<String> {
    vec!["Categoria:".to_string(), "Category:".to_string()]
}

fn default_content_prefix() -> String {
    "/wiki/".to_string()
}

fn default_listing_link_cap() -> usize {
    100
}

fn default_prose_link_cap() -> usize {
    30
}

fn default_prose_region_limit() -> usize {
    20
}
