//! Fan-out coordinator configuration

use std::time::Duration;

use crate::broadcast::DEFAULT_PIPE_BUFFER;

/// Coordinator configuration options
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Per-lane pipe buffer size in bytes
    pub pipe_buffer_size: usize,

    /// Maximum concurrently in-flight broadcasts (0 = unlimited)
    pub max_in_flight: usize,

    /// MIME type passed to the archival consumer
    pub mime_type: String,

    /// How long shutdown waits for in-flight broadcasts before discarding them
    pub shutdown_grace: Duration,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            pipe_buffer_size: DEFAULT_PIPE_BUFFER,
            max_in_flight: 0, // Unlimited
            mime_type: "image/jpeg".to_string(),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl FanoutConfig {
    /// Set the per-lane pipe buffer size
    pub fn pipe_buffer_size(mut self, size: usize) -> Self {
        self.pipe_buffer_size = size.max(1);
        self
    }

    /// Set the in-flight broadcast limit
    pub fn max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max;
        self
    }

    /// Set the MIME type handed to the archival consumer
    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = mime.into();
        self
    }

    /// Set the shutdown grace timeout
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}
