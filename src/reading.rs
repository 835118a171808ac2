//! Meter reading and aggregated artifact types
//!
//! The structured reading extracted from a gauge image, and the artifact
//! that joins it with the archival reference for delivery.

use serde::{Deserialize, Serialize};

/// Structured reading extracted from one gauge image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    /// Meter value as reported by the extractor (e.g. "123.4")
    pub read: String,

    /// Date printed on or inferred for the reading (e.g. "2025-01-01")
    pub date: String,

    /// How long extraction took, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl MeterReading {
    /// Create a reading without timing info
    pub fn new(read: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            read: read.into(),
            date: date.into(),
            elapsed_ms: None,
        }
    }

    /// Parse the reported value as a number
    pub fn value(&self) -> Result<f64, std::num::ParseFloatError> {
        self.read.parse()
    }
}

/// Joined result of one successful broadcast
///
/// Produced only when the extraction consumer succeeded. The archival
/// reference is best-effort: `None` when the archive consumer failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeArtifact {
    /// The extracted reading, flattened into the artifact
    #[serde(flatten)]
    pub reading: MeterReading,

    /// URL of the archived source image, if archival succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_image_url: Option<String>,
}

impl GaugeArtifact {
    /// Create a new artifact
    pub fn new(reading: MeterReading, src_image_url: Option<String>) -> Self {
        Self {
            reading,
            src_image_url,
        }
    }
}
