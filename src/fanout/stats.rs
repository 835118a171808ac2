//! Coordinator counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal atomic counters shared across broadcast tasks
#[derive(Debug, Default)]
pub(super) struct FanoutStats {
    pub(super) started: AtomicU64,
    pub(super) aggregated: AtomicU64,
    pub(super) abandoned: AtomicU64,
    pub(super) rejected: AtomicU64,
    pub(super) bytes_copied: AtomicU64,
}

impl FanoutStats {
    pub(super) fn snapshot(&self) -> FanoutSnapshot {
        FanoutSnapshot {
            started: self.started.load(Ordering::Relaxed),
            aggregated: self.aggregated.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of coordinator activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutSnapshot {
    /// Broadcasts started
    pub started: u64,
    /// Broadcasts that produced an artifact
    pub aggregated: u64,
    /// Broadcasts abandoned without an artifact
    pub abandoned: u64,
    /// Broadcasts rejected by the in-flight limit
    pub rejected: u64,
    /// Total source bytes copied into broadcast pipes
    pub bytes_copied: u64,
}
