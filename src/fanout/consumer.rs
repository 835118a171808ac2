//! Consumer seams
//!
//! The two external collaborators a broadcast fans out to: the archival
//! store and the reading extractor. Both are handed an owned read-endpoint
//! and are expected to drain or drop it; the coordinator never inspects the
//! stream itself.

use async_trait::async_trait;

use crate::broadcast::BroadcastReader;
use crate::reading::MeterReading;

/// Failure reported by a consumer
///
/// Opaque on purpose: consumers are external collaborators and the
/// coordinator only needs the failure reason for logging and the
/// abandon decision.
#[derive(Debug, Clone)]
pub struct ConsumerError {
    message: String,
}

impl ConsumerError {
    /// Create a new consumer error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure reason
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConsumerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConsumerError {}

impl From<std::io::Error> for ConsumerError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Archival consumer: stores the raw image stream
///
/// Best-effort. A failure is recorded as an absent archival reference and
/// never aborts the broadcast.
#[async_trait]
pub trait ImageArchiver: Send + Sync {
    /// Store the image and return a URL for the stored object
    async fn archive(&self, image: BroadcastReader, mime_type: &str)
        -> Result<String, ConsumerError>;
}

/// Extraction consumer: turns the image stream into a structured reading
///
/// Required. A failure, or an `Ok(None)` empty result, abandons the
/// broadcast.
#[async_trait]
pub trait ReadingExtractor: Send + Sync {
    /// Extract a meter reading from the image
    ///
    /// `Ok(None)` means the extractor ran but produced no usable reading.
    async fn extract(&self, image: BroadcastReader) -> Result<Option<MeterReading>, ConsumerError>;
}
