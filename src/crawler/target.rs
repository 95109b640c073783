use std::fmt;
use url::Url;

/// Frontier tier; high-priority targets are always popped first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    High,
    Normal,
}

/// Where a target was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginContext {
    Seed,
    CategoryListing,
    ProseLink,
}

impl OriginContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginContext::Seed => "seed",
            OriginContext::CategoryListing => "category-listing",
            OriginContext::ProseLink => "prose-link",
        }
    }
}

/// A URL proposed for fetching
///
/// Targets are immutable once created and are consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: Url,
    pub priority: Priority,
    pub origin: OriginContext,
}

impl CrawlTarget {
    pub fn new(url: Url, priority: Priority, origin: OriginContext) -> Self {
        Self {
            url,
            priority,
            origin,
        }
    }

    /// A seed target, always high priority
    pub fn seed(url: Url) -> Self {
        Self::new(url, Priority::High, OriginContext::Seed)
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {})", self.url, self.priority, self.origin.as_str())
    }
}
