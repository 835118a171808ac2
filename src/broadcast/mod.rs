//! Stream broadcast pipe
//!
//! Duplicates one write-stream into `n` independently-consumable
//! read-streams. Each reader is backed by its own in-memory pipe, so a slow
//! consumer never corrupts data for a fast one; it does, by design, block
//! the writer, because a write is complete only once every lane accepted
//! the chunk.
//!
//! # Architecture
//!
//! ```text
//!                      BroadcastWriter
//!                  ┌─────────────────────┐
//!     write(chunk) │ lane 0   lane 1 ... │
//!     ────────────►│   │        │        │
//!                  └───┼────────┼────────┘
//!                      │ pipe   │ pipe
//!                      ▼        ▼
//!              [BroadcastReader] [BroadcastReader]
//!               archive consumer  extract consumer
//! ```
//!
//! # Partial-failure isolation
//!
//! A dead lane (reader closed early) causes subsequent writes to carry a
//! [`LaneFault`] for that lane only; siblings keep receiving every byte in
//! order, and the producer is told the full chunk was accepted so it can
//! keep draining its source.

pub mod error;
pub mod pipe;

pub use error::{BroadcastError, LaneFault};
pub use pipe::{
    broadcast_copy, broadcast_pair, broadcast_pipe, broadcast_pipe_with, BroadcastReader,
    BroadcastWriter, WriteReport, DEFAULT_PIPE_BUFFER,
};
