//! Robots.txt cache entries
//!
//! Entries expire after 24 hours.

use crate::robots::RobotsRules;
use chrono::{DateTime, Duration, Utc};

/// Robots.txt rules for a site and when they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: RobotsRules,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// True once the entry is older than 24 hours
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry() {
        let entry = CachedRobots::new(RobotsRules::allow_all());
        assert!(!entry.is_stale());
    }

    #[test]
    fn test_stale_after_a_day() {
        let mut entry = CachedRobots::new(RobotsRules::allow_all());

        entry.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!entry.is_stale());

        entry.fetched_at = Utc::now() - Duration::hours(25);
        assert!(entry.is_stale());
    }
}
