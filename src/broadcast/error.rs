//! Broadcast error types
//!
//! Error types for broadcast pipe operations.

use std::io;

/// Failure of a single internal lane during a write or close
///
/// Carried inside a successful `WriteReport` so that the producer is never
/// short-written because one unrelated consumer died.
#[derive(Debug)]
pub struct LaneFault {
    /// Index of the lane that failed
    pub lane: usize,
    /// The underlying I/O error
    pub error: io::Error,
}

impl LaneFault {
    pub(crate) fn new(lane: usize, error: io::Error) -> Self {
        Self { lane, error }
    }
}

impl std::fmt::Display for LaneFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lane {}: {}", self.lane, self.error)
    }
}

/// Error type for broadcast pipe operations
#[derive(Debug)]
pub enum BroadcastError {
    /// Write attempted after the write-endpoint was closed
    Closed,
    /// One internal lane failed; siblings were still attempted
    Lane(LaneFault),
}

impl std::fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BroadcastError::Closed => write!(f, "broadcast pipe is closed"),
            BroadcastError::Lane(fault) => write!(f, "broadcast lane failed: {}", fault),
        }
    }
}

impl std::error::Error for BroadcastError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BroadcastError::Closed => None,
            BroadcastError::Lane(fault) => Some(&fault.error),
        }
    }
}
