//! Broadcast lifecycle state
//!
//! One broadcast moves through a fixed set of phases; no transition skips
//! the join barrier, and both terminal phases are final.

use std::time::{Duration, Instant};

/// Phase of one broadcast lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastPhase {
    /// Broadcast set created, nothing running yet
    Created,
    /// Copy task and consumers running
    Streaming,
    /// Both consumers completed, outcome not yet decided
    Joined,
    /// Artifact built and delivered
    Aggregated,
    /// No artifact produced (extraction failed or returned nothing)
    Abandoned,
}

impl BroadcastPhase {
    /// Whether this phase is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, BroadcastPhase::Aggregated | BroadcastPhase::Abandoned)
    }

    /// Whether `next` is a valid successor of this phase
    pub fn can_advance_to(self, next: BroadcastPhase) -> bool {
        matches!(
            (self, next),
            (BroadcastPhase::Created, BroadcastPhase::Streaming)
                | (BroadcastPhase::Streaming, BroadcastPhase::Joined)
                | (BroadcastPhase::Joined, BroadcastPhase::Aggregated)
                | (BroadcastPhase::Joined, BroadcastPhase::Abandoned)
        )
    }
}

/// Lifecycle tracker for one broadcast
#[derive(Debug)]
pub struct BroadcastLifecycle {
    id: u64,
    phase: BroadcastPhase,
    started_at: Instant,
}

impl BroadcastLifecycle {
    /// Start tracking a new broadcast
    pub fn new(id: u64) -> Self {
        tracing::debug!(broadcast_id = id, "broadcast created");
        Self {
            id,
            phase: BroadcastPhase::Created,
            started_at: Instant::now(),
        }
    }

    /// Broadcast ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current phase
    pub fn phase(&self) -> BroadcastPhase {
        self.phase
    }

    /// Time since the broadcast was created
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Advance to the next phase
    ///
    /// Transitions are checked in debug builds; the coordinator is the only
    /// caller and drives them in a fixed order.
    pub fn advance(&mut self, next: BroadcastPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid broadcast phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!(
            broadcast_id = self.id,
            from = ?self.phase,
            to = ?next,
            "broadcast phase change"
        );
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(BroadcastPhase::Created.can_advance_to(BroadcastPhase::Streaming));
        assert!(BroadcastPhase::Streaming.can_advance_to(BroadcastPhase::Joined));
        assert!(BroadcastPhase::Joined.can_advance_to(BroadcastPhase::Aggregated));
        assert!(BroadcastPhase::Joined.can_advance_to(BroadcastPhase::Abandoned));
    }

    #[test]
    fn test_no_transition_skips_join() {
        assert!(!BroadcastPhase::Created.can_advance_to(BroadcastPhase::Joined));
        assert!(!BroadcastPhase::Streaming.can_advance_to(BroadcastPhase::Aggregated));
        assert!(!BroadcastPhase::Streaming.can_advance_to(BroadcastPhase::Abandoned));
        assert!(!BroadcastPhase::Created.can_advance_to(BroadcastPhase::Abandoned));
    }

    #[test]
    fn test_terminal_phases_are_final() {
        for terminal in [BroadcastPhase::Aggregated, BroadcastPhase::Abandoned] {
            assert!(terminal.is_terminal());
            for next in [
                BroadcastPhase::Created,
                BroadcastPhase::Streaming,
                BroadcastPhase::Joined,
                BroadcastPhase::Aggregated,
                BroadcastPhase::Abandoned,
            ] {
                assert!(!terminal.can_advance_to(next));
            }
        }
    }

    #[test]
    fn test_lifecycle_advances() {
        let mut lifecycle = BroadcastLifecycle::new(7);
        assert_eq!(lifecycle.id(), 7);
        assert_eq!(lifecycle.phase(), BroadcastPhase::Created);

        lifecycle.advance(BroadcastPhase::Streaming);
        lifecycle.advance(BroadcastPhase::Joined);
        lifecycle.advance(BroadcastPhase::Aggregated);
        assert!(lifecycle.phase().is_terminal());
    }
}
