//! Retry and backoff policy for page fetches
//!
//! Failures are classified into a [`FailureKind`]; each kind has its own
//! backoff window:
//!
//! | Failure       | Window               | Escalates | Rotates identity |
//! |---------------|----------------------|-----------|------------------|
//! | HTTP 403      | `block-backoff`      | yes       | if configured    |
//! | HTTP 429      | `rate-limit-backoff` | yes       | no               |
//! | other / I/O   | `transport-backoff`  | no        | no               |
//!
//! Escalating windows are multiplied by the attempt number, so the second
//! retry after a 429 waits twice as long as the first.

use crate::config::{DelayRange, FetchConfig};
use rand::Rng;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Classification of a failed fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, DNS failure, connection reset or unreadable body
    Transport(String),

    /// HTTP 403, a soft block
    Blocked,

    /// HTTP 429
    RateLimited,

    /// Any other non-2xx status
    Status(u16),
}

impl FailureKind {
    /// Maps a non-success status code to its failure kind
    pub fn from_status(status: u16) -> Self {
        match status {
            403 => FailureKind::Blocked,
            429 => FailureKind::RateLimited,
            other => FailureKind::Status(other),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport(e) => write!(f, "transport error: {}", e),
            FailureKind::Blocked => write!(f, "blocked (HTTP 403)"),
            FailureKind::RateLimited => write!(f, "rate limited (HTTP 429)"),
            FailureKind::Status(code) => write!(f, "HTTP {}", code),
        }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry {
        /// How long to wait before the next attempt
        delay: Duration,
        /// The attempt number about to be made (1-indexed)
        attempt: u32,
        /// Switch identity before retrying
        rotate_identity: bool,
    },

    /// Attempts are exhausted
    GiveUp,
}

/// Retry limits and delay windows for one fetch client
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    inter_request_delay: DelayRange,
    transport_backoff: DelayRange,
    block_backoff: DelayRange,
    rate_limit_backoff: DelayRange,
    rotate_identity_on_block: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            inter_request_delay: config.inter_request_delay,
            transport_backoff: config.transport_backoff,
            block_backoff: config.block_backoff,
            rate_limit_backoff: config.rate_limit_backoff,
            rotate_identity_on_block: config.rotate_identity_on_block,
        }
    }

    /// Randomized pause applied before every request
    pub fn jitter(&self) -> Duration {
        sample(&self.inter_request_delay)
    }

    /// Decides whether to retry after `attempt` (1-indexed) failed with `kind`
    pub fn should_retry(&self, kind: &FailureKind, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!("Max attempts ({}) reached after {}", self.max_attempts, kind);
            return RetryDecision::GiveUp;
        }

        RetryDecision::Retry {
            delay: self.backoff(kind, attempt),
            attempt: attempt + 1,
            rotate_identity: matches!(kind, FailureKind::Blocked) && self.rotate_identity_on_block,
        }
    }

    /// Backoff before the attempt following `attempt`
    pub fn backoff(&self, kind: &FailureKind, attempt: u32) -> Duration {
        match kind {
            FailureKind::Blocked => sample(&self.block_backoff) * attempt.max(1),
            FailureKind::RateLimited => sample(&self.rate_limit_backoff) * attempt.max(1),
            FailureKind::Transport(_) | FailureKind::Status(_) => sample(&self.transport_backoff),
        }
    }
}

/// Draws a uniformly random duration from a closed range of seconds
fn sample(range: &DelayRange) -> Duration {
    if range.max <= range.min {
        return Duration::from_secs_f64(range.min.max(0.0));
    }

    let secs = rand::thread_rng().gen_range(range.min..=range.max);
    Duration::from_secs_f64(secs)
}
