//! Fan-out coordination
//!
//! Given one source stream and the two consumer collaborators, the
//! coordinator creates a fresh broadcast pipe, runs each consumer
//! concurrently against its own read-endpoint, joins both outcomes, and
//! produces at most one aggregated artifact per broadcast.
//!
//! # Architecture
//!
//! ```text
//!   source ──► copy task ──► BroadcastWriter
//!                               │        │
//!                          lane 0    lane 1
//!                               ▼        ▼
//!                      archive task  extract task
//!                               │        │
//!                               └──join──┘
//!                                   │
//!                     extraction ok?┤
//!                        no ──► Abandoned (logged, no artifact)
//!                        yes ─► GaugeArtifact ──► delivery queue
//! ```
//!
//! The join never short-circuits: a fast-failing consumer cannot abandon a
//! slow-succeeding one mid-flight. The extraction outcome is the single
//! required dependency; the archival outcome is best-effort.

pub mod config;
pub mod consumer;
pub mod coordinator;
pub mod state;
pub mod stats;

pub use config::FanoutConfig;
pub use consumer::{ConsumerError, ImageArchiver, ReadingExtractor};
pub use coordinator::{AbandonReason, BroadcastOutcome, FanoutCoordinator};
pub use state::{BroadcastLifecycle, BroadcastPhase};
pub use stats::FanoutSnapshot;
