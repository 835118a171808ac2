//! Latest-value sink
//!
//! Consumes aggregated artifacts from the delivery queue and exposes the
//! most recent one. The cell is the only mutable state outside the fan-out
//! core, guarded by its own lock and mutated only by the sink loop; readers
//! see `None` until at least one broadcast completed successfully.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::RwLock;

use crate::delivery::DeliveryReceiver;
use crate::reading::GaugeArtifact;

/// Most recent sensor value with its source artifact
#[derive(Debug, Clone)]
pub struct SensorValue {
    /// Parsed numeric reading
    pub value: f64,

    /// The artifact the value came from
    pub artifact: GaugeArtifact,

    /// When the sink recorded this value
    pub updated_at: SystemTime,
}

/// Shared cell holding the latest successfully-parsed reading
#[derive(Debug, Default)]
pub struct LatestReading {
    current: RwLock<Option<SensorValue>>,
}

impl LatestReading {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new value
    pub async fn set(&self, value: f64, artifact: GaugeArtifact) {
        let mut current = self.current.write().await;
        *current = Some(SensorValue {
            value,
            artifact,
            updated_at: SystemTime::now(),
        });
    }

    /// Get the latest value, or `None` if no broadcast succeeded yet
    pub async fn get(&self) -> Option<SensorValue> {
        self.current.read().await.clone()
    }
}

/// Run the sink loop until the delivery queue closes
///
/// Parses each artifact's reading as a number and updates the cell.
/// Unparsable readings are skipped with a warning; the artifact was
/// delivered, its value just cannot be exposed numerically.
pub async fn run_sink(mut deliveries: DeliveryReceiver, latest: Arc<LatestReading>) {
    while let Some(artifact) = deliveries.next().await {
        match artifact.reading.value() {
            Ok(value) => {
                tracing::info!(read = %artifact.reading.read, value, "sensor value updated");
                latest.set(value, artifact).await;
            }
            Err(e) => {
                tracing::warn!(
                    read = %artifact.reading.read,
                    error = %e,
                    "skipping artifact with unparsable reading"
                );
            }
        }
    }
    tracing::debug!("delivery queue closed, sink stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::delivery_queue;
    use crate::reading::MeterReading;

    fn artifact(read: &str) -> GaugeArtifact {
        GaugeArtifact::new(MeterReading::new(read, "2025-01-01"), None)
    }

    #[tokio::test]
    async fn test_empty_cell_reads_none() {
        let latest = LatestReading::new();
        assert!(latest.get().await.is_none());
    }

    #[tokio::test]
    async fn test_sink_updates_latest_value() {
        let (tx, rx) = delivery_queue(4);
        let latest = Arc::new(LatestReading::new());
        let sink = tokio::spawn(run_sink(rx, Arc::clone(&latest)));

        tx.deliver(artifact("123.4")).await.unwrap();
        tx.deliver(artifact("125.0")).await.unwrap();
        drop(tx);
        sink.await.unwrap();

        let value = latest.get().await.unwrap();
        assert_eq!(value.value, 125.0);
        assert_eq!(value.artifact.reading.read, "125.0");
    }

    #[tokio::test]
    async fn test_sink_skips_unparsable_readings() {
        let (tx, rx) = delivery_queue(4);
        let latest = Arc::new(LatestReading::new());
        let sink = tokio::spawn(run_sink(rx, Arc::clone(&latest)));

        tx.deliver(artifact("99.9")).await.unwrap();
        tx.deliver(artifact("1?3.4")).await.unwrap();
        drop(tx);
        sink.await.unwrap();

        // The garbage reading did not clobber the last good value
        let value = latest.get().await.unwrap();
        assert_eq!(value.value, 99.9);
    }
}
