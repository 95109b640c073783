//! Crawl run phases and terminal outcomes
//!
//! A run moves `Seeding → Running → {Draining, Exhausted, Halted} → Finalized`.
//! Finalized is reachable from every other phase so an interruption never
//! skips the stats flush.

use crate::HarvestError;
use std::fmt;
use std::sync::Mutex;

/// Phase of one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Seeds are being enqueued
    Seeding,

    /// Workers are pulling from the frontier
    Running,

    // ===== Stopping States =====
    /// Target count reached; in-flight work finishes, nothing new starts
    Draining,

    /// Frontier emptied with the target unmet
    Exhausted,

    /// The governor tripped
    Halted,

    /// Stats have been handed to the stats collaborator
    Finalized,
}

impl CrawlPhase {
    /// Returns true if the phase ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Returns true for the three phases that lead straight to finalization
    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Draining | Self::Exhausted | Self::Halted)
    }

    /// Returns true if a run may move from this phase to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (self, next) {
            (Finalized, _) => false,
            (_, Finalized) => true,
            (Seeding, Running | Draining | Exhausted | Halted) => true,
            (Running, Draining | Exhausted | Halted) => true,
            _ => false,
        }
    }

    /// Converts the phase to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Exhausted => "exhausted",
            Self::Halted => "halted",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Which governor ceiling was crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HaltReason {
    WallClock,
    PageBudget,
    ConsecutiveFailures,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HaltReason::WallClock => "wall-clock budget exceeded",
            HaltReason::PageBudget => "page budget exhausted",
            HaltReason::ConsecutiveFailures => "too many consecutive failures",
        };
        write!(f, "{}", text)
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlOutcome {
    TargetReached,
    FrontierExhausted,
    Halted(HaltReason),
    Interrupted,
}

impl CrawlOutcome {
    /// The stopping phase this outcome passes through before finalization
    pub fn phase(&self) -> Option<CrawlPhase> {
        match self {
            CrawlOutcome::TargetReached => Some(CrawlPhase::Draining),
            CrawlOutcome::FrontierExhausted => Some(CrawlPhase::Exhausted),
            CrawlOutcome::Halted(_) => Some(CrawlPhase::Halted),
            CrawlOutcome::Interrupted => None,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            CrawlOutcome::TargetReached => "target_reached",
            CrawlOutcome::FrontierExhausted => "frontier_exhausted",
            CrawlOutcome::Halted(HaltReason::WallClock) => "halted_wall_clock",
            CrawlOutcome::Halted(HaltReason::PageBudget) => "halted_page_budget",
            CrawlOutcome::Halted(HaltReason::ConsecutiveFailures) => "halted_failures",
            CrawlOutcome::Interrupted => "interrupted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "target_reached" => Some(CrawlOutcome::TargetReached),
            "frontier_exhausted" => Some(CrawlOutcome::FrontierExhausted),
            "halted_wall_clock" => Some(CrawlOutcome::Halted(HaltReason::WallClock)),
            "halted_page_budget" => Some(CrawlOutcome::Halted(HaltReason::PageBudget)),
            "halted_failures" => Some(CrawlOutcome::Halted(HaltReason::ConsecutiveFailures)),
            "interrupted" => Some(CrawlOutcome::Interrupted),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlOutcome::TargetReached => write!(f, "target reached"),
            CrawlOutcome::FrontierExhausted => write!(f, "frontier exhausted"),
            CrawlOutcome::Halted(reason) => write!(f, "halted: {}", reason),
            CrawlOutcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Current phase of a run, guarded against invalid transitions
#[derive(Debug)]
pub struct PhaseTracker {
    phase: Mutex<CrawlPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(CrawlPhase::Seeding),
        }
    }

    pub fn current(&self) -> CrawlPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Moves to `next`; staying in the current phase is a no-op
    pub fn advance(&self, next: CrawlPhase) -> Result<(), HarvestError> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());

        if *phase == next {
            return Ok(());
        }

        if !phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: *phase,
                to: next,
            });
        }

        tracing::info!("Phase {} -> {}", *phase, next);
        *phase = next;
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHASES: [CrawlPhase; 6] = [
        CrawlPhase::Seeding,
        CrawlPhase::Running,
        CrawlPhase::Draining,
        CrawlPhase::Exhausted,
        CrawlPhase::Halted,
        CrawlPhase::Finalized,
    ];

    #[test]
    fn test_finalized_reachable_from_every_phase() {
        for phase in PHASES {
            if phase != CrawlPhase::Finalized {
                assert!(phase.can_transition_to(CrawlPhase::Finalized), "{}", phase);
            }
        }
        assert!(!CrawlPhase::Finalized.can_transition_to(CrawlPhase::Finalized));
    }

    #[test]
    fn test_stopping_phases_only_finalize() {
        for phase in [CrawlPhase::Draining, CrawlPhase::Exhausted, CrawlPhase::Halted] {
            assert!(phase.is_stopping());
            let allowed: Vec<CrawlPhase> = PHASES
                .into_iter()
                .filter(|next| phase.can_transition_to(*next))
                .collect();
            assert_eq!(allowed, vec![CrawlPhase::Finalized]);
        }
    }

    #[test]
    fn test_seeding_can_drain_immediately() {
        assert!(CrawlPhase::Seeding.can_transition_to(CrawlPhase::Draining));
        assert!(!CrawlPhase::Running.can_transition_to(CrawlPhase::Seeding));
    }

    #[test]
    fn test_outcome_db_string() {
        let outcomes = [
            CrawlOutcome::TargetReached,
            CrawlOutcome::FrontierExhausted,
            CrawlOutcome::Halted(HaltReason::WallClock),
            CrawlOutcome::Halted(HaltReason::PageBudget),
            CrawlOutcome::Halted(HaltReason::ConsecutiveFailures),
            CrawlOutcome::Interrupted,
        ];
        for outcome in outcomes {
            assert_eq!(CrawlOutcome::from_db_string(outcome.to_db_string()), Some(outcome));
        }
    }

    #[test]
    fn test_tracker_rejects_invalid_transition() {
        let tracker = PhaseTracker::new();
        tracker.advance(CrawlPhase::Running).unwrap();
        tracker.advance(CrawlPhase::Running).unwrap();
        tracker.advance(CrawlPhase::Halted).unwrap();

        let err = tracker.advance(CrawlPhase::Running).unwrap_err();
        assert!(matches!(err, HarvestError::InvalidTransition { .. }));

        tracker.advance(CrawlPhase::Finalized).unwrap();
        assert!(tracker.current().is_terminal());
    }
}
