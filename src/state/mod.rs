//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: The run state machine (seeding, running, stopping, finalized)
//! - `CrawlOutcome`: Why a run stopped
//! - `SharedStats`: Process-wide counters shared by every worker

mod phase;
mod stats;

// Re-export main types
pub use phase::{CrawlOutcome, CrawlPhase, HaltReason, PhaseTracker};
pub use stats::{AcceptedPage, CrawlStats, SharedStats};
