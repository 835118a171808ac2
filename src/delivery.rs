//! Bounded delivery queue
//!
//! Ordered, fixed-capacity channel carrying aggregated artifacts from the
//! fan-out coordinator to the latest-value sink. Created once at process
//! start and closed once at shutdown. When full, delivery blocks the
//! producer (back-pressure) instead of dropping data; delivery after close
//! is a lifecycle error and fails loudly.

use tokio::sync::mpsc;

use crate::reading::GaugeArtifact;

/// Error type for delivery queue operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Delivery attempted after the queue was closed
    Closed,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Closed => write!(f, "delivery queue is closed"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Producer side of the delivery queue
#[derive(Debug, Clone)]
pub struct DeliverySender {
    tx: mpsc::Sender<GaugeArtifact>,
}

impl DeliverySender {
    /// Enqueue an artifact
    ///
    /// Blocks while the queue is full. Fails with [`DeliveryError::Closed`]
    /// once the receiver has been closed or dropped; the artifact is handed
    /// back to no one, so callers must log it, never swallow it.
    pub async fn deliver(&self, artifact: GaugeArtifact) -> Result<(), DeliveryError> {
        self.tx
            .send(artifact)
            .await
            .map_err(|_| DeliveryError::Closed)
    }

    /// Whether the consumer side has closed the queue
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the delivery queue
#[derive(Debug)]
pub struct DeliveryReceiver {
    rx: mpsc::Receiver<GaugeArtifact>,
}

impl DeliveryReceiver {
    /// Receive the next artifact, or `None` once the queue is closed and
    /// drained
    pub async fn next(&mut self) -> Option<GaugeArtifact> {
        self.rx.recv().await
    }

    /// Receive an artifact without waiting
    pub fn try_next(&mut self) -> Option<GaugeArtifact> {
        self.rx.try_recv().ok()
    }

    /// Close the queue
    ///
    /// Idempotent. Rejects all further deliveries and discards anything
    /// still buffered, with a logged warning rather than silent loss.
    pub fn close(&mut self) {
        self.rx.close();

        let mut discarded: u64 = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::warn!(discarded, "discarded undelivered artifacts at queue close");
        }
    }
}

/// Create a bounded delivery queue
///
/// # Panics
///
/// Panics if `capacity == 0`.
pub fn delivery_queue(capacity: usize) -> (DeliverySender, DeliveryReceiver) {
    assert!(capacity >= 1, "delivery queue needs capacity of at least one");
    let (tx, rx) = mpsc::channel(capacity);
    (DeliverySender { tx }, DeliveryReceiver { rx })
}
