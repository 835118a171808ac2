//! Fan-out coordinator
//!
//! Runs one broadcast end to end: duplicates a source stream to the archive
//! and extraction consumers, joins both outcomes, and delivers at most one
//! aggregated artifact to the bounded queue. Each broadcast owns all of its
//! state; nothing leaks between concurrent broadcasts.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::broadcast::{broadcast_copy, broadcast_pair};
use crate::delivery::DeliverySender;
use crate::error::{Error, Result};
use crate::reading::GaugeArtifact;

use super::config::FanoutConfig;
use super::consumer::{ConsumerError, ImageArchiver, ReadingExtractor};
use super::state::{BroadcastLifecycle, BroadcastPhase};
use super::stats::{FanoutSnapshot, FanoutStats};

/// Why a broadcast produced no artifact
#[derive(Debug, Clone)]
pub enum AbandonReason {
    /// The extraction consumer failed
    ExtractionFailed(ConsumerError),
    /// The extraction consumer ran but produced no reading
    EmptyReading,
}

impl std::fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbandonReason::ExtractionFailed(e) => write!(f, "extraction failed: {}", e),
            AbandonReason::EmptyReading => write!(f, "extractor returned no reading"),
        }
    }
}

/// Terminal outcome of one broadcast
#[derive(Debug, Clone)]
pub enum BroadcastOutcome {
    /// An artifact was built and delivered to the queue
    Aggregated(GaugeArtifact),
    /// No artifact was produced
    Abandoned(AbandonReason),
}

impl BroadcastOutcome {
    /// Whether the broadcast produced an artifact
    pub fn is_aggregated(&self) -> bool {
        matches!(self, BroadcastOutcome::Aggregated(_))
    }
}

/// Coordinates concurrent consumers over one broadcast pipe per source
///
/// Constructed once at the composition root with the two consumer
/// collaborators and the producer side of the delivery queue. One inbound
/// message maps to one [`FanoutCoordinator::spawn_broadcast`] call; the
/// coordinator builds a fresh broadcast set per call, so per-message
/// lifecycles are explicit values instead of closures over shared state.
pub struct FanoutCoordinator {
    config: FanoutConfig,
    archiver: Arc<dyn ImageArchiver>,
    extractor: Arc<dyn ReadingExtractor>,
    deliveries: DeliverySender,
    inflight: Option<Arc<Semaphore>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    stats: Arc<FanoutStats>,
    next_broadcast_id: AtomicU64,
}

impl FanoutCoordinator {
    /// Create a new coordinator
    pub fn new(
        config: FanoutConfig,
        archiver: Arc<dyn ImageArchiver>,
        extractor: Arc<dyn ReadingExtractor>,
        deliveries: DeliverySender,
    ) -> Self {
        let inflight = if config.max_in_flight > 0 {
            Some(Arc::new(Semaphore::new(config.max_in_flight)))
        } else {
            None
        };

        Self {
            config,
            archiver,
            extractor,
            deliveries,
            inflight,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            stats: Arc::new(FanoutStats::default()),
            next_broadcast_id: AtomicU64::new(1),
        }
    }

    /// Get the coordinator configuration
    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// Snapshot of coordinator activity counters
    pub fn stats(&self) -> FanoutSnapshot {
        self.stats.snapshot()
    }

    /// Token cancelled when [`FanoutCoordinator::shutdown`] begins
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one broadcast to completion
    ///
    /// Spawns the copy task and both consumer tasks, joins both consumers
    /// without short-circuiting, then decides the outcome: an extraction
    /// failure or empty reading abandons the broadcast; an archival failure
    /// alone yields an artifact without an archival reference. Every
    /// endpoint is closed on every exit path.
    ///
    /// Returns `Err` only for delivery failures, which indicate the queue
    /// was closed underneath a live broadcast.
    pub async fn run_broadcast<S>(&self, source: S) -> Result<BroadcastOutcome>
    where
        S: AsyncRead + Send + Unpin + 'static,
    {
        let id = self.next_broadcast_id.fetch_add(1, Ordering::Relaxed);
        self.stats.started.fetch_add(1, Ordering::Relaxed);
        let mut lifecycle = BroadcastLifecycle::new(id);

        let (mut writer, archive_rx, extract_rx) = broadcast_pair(self.config.pipe_buffer_size);

        // Copy task: drain the source into the pipe, close the writer on
        // every exit path so readers always observe end-of-stream.
        let cancel = self.cancel.clone();
        let stats = Arc::clone(&self.stats);
        let copy_task = tokio::spawn(async move {
            let mut source = source;
            let result = tokio::select! {
                res = broadcast_copy(&mut source, &mut writer) => res,
                _ = cancel.cancelled() => {
                    Err(io::Error::new(io::ErrorKind::Interrupted, "broadcast cancelled"))
                }
            };
            if let Err(e) = writer.close().await {
                tracing::warn!(broadcast_id = id, error = %e, "error closing broadcast writer");
            }
            match result {
                Ok(copied) => {
                    stats.bytes_copied.fetch_add(copied, Ordering::Relaxed);
                    tracing::debug!(broadcast_id = id, copied, "source drained");
                }
                Err(e) => {
                    // Consumers see a short stream; the extraction outcome
                    // decides whether the broadcast survives it.
                    tracing::warn!(broadcast_id = id, error = %e, "source copy ended early");
                }
            }
        });

        lifecycle.advance(BroadcastPhase::Streaming);

        let archiver = Arc::clone(&self.archiver);
        let mime = self.config.mime_type.clone();
        let cancel = self.cancel.clone();
        let archive_task = tokio::spawn(async move {
            tokio::select! {
                res = archiver.archive(archive_rx, &mime) => res,
                _ = cancel.cancelled() => Err(ConsumerError::new("archive cancelled")),
            }
        });

        let extractor = Arc::clone(&self.extractor);
        let cancel = self.cancel.clone();
        let extract_task = tokio::spawn(async move {
            tokio::select! {
                res = extractor.extract(extract_rx) => res,
                _ = cancel.cancelled() => Err(ConsumerError::new("extraction cancelled")),
            }
        });

        // Join barrier: both consumers must finish before any decision, so
        // a fast-failing consumer cannot abandon a slow-succeeding one.
        let (archive_res, extract_res) = tokio::join!(archive_task, extract_task);
        if let Err(e) = copy_task.await {
            tracing::warn!(broadcast_id = id, error = %e, "copy task failed");
        }
        lifecycle.advance(BroadcastPhase::Joined);

        let reading = match extract_res {
            Ok(Ok(Some(reading))) => reading,
            Ok(Ok(None)) => {
                return Ok(self.abandon(&mut lifecycle, AbandonReason::EmptyReading));
            }
            Ok(Err(e)) => {
                return Ok(self.abandon(&mut lifecycle, AbandonReason::ExtractionFailed(e)));
            }
            Err(join_err) => {
                let e = ConsumerError::new(format!("extraction task failed: {}", join_err));
                return Ok(self.abandon(&mut lifecycle, AbandonReason::ExtractionFailed(e)));
            }
        };

        let src_image_url = match archive_res {
            Ok(Ok(url)) => {
                tracing::info!(broadcast_id = id, url = %url, "image archived");
                Some(url)
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    broadcast_id = id,
                    error = %e,
                    "image archive failed, keeping reading without reference"
                );
                None
            }
            Err(join_err) => {
                tracing::warn!(broadcast_id = id, error = %join_err, "archive task failed");
                None
            }
        };

        let artifact = GaugeArtifact::new(reading, src_image_url);
        if let Err(e) = self.deliveries.deliver(artifact.clone()).await {
            tracing::error!(broadcast_id = id, error = %e, "artifact delivery failed");
            return Err(Error::Delivery(e));
        }

        lifecycle.advance(BroadcastPhase::Aggregated);
        self.stats.aggregated.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            broadcast_id = id,
            read = %artifact.reading.read,
            elapsed_ms = lifecycle.elapsed().as_millis() as u64,
            "broadcast aggregated"
        );

        Ok(BroadcastOutcome::Aggregated(artifact))
    }

    fn abandon(
        &self,
        lifecycle: &mut BroadcastLifecycle,
        reason: AbandonReason,
    ) -> BroadcastOutcome {
        lifecycle.advance(BroadcastPhase::Abandoned);
        self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            broadcast_id = lifecycle.id(),
            reason = %reason,
            "broadcast abandoned"
        );
        BroadcastOutcome::Abandoned(reason)
    }

    /// Spawn one broadcast per inbound source
    ///
    /// Bounds concurrently in-flight broadcasts when `max_in_flight` is set;
    /// a rejected broadcast is counted and logged, never queued. Returns
    /// whether the broadcast was admitted.
    pub fn spawn_broadcast<S>(self: &Arc<Self>, source: S) -> bool
    where
        S: AsyncRead + Send + Unpin + 'static,
    {
        let permit = match &self.inflight {
            Some(sem) => match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("broadcast rejected: in-flight limit reached");
                    return false;
                }
            },
            None => None,
        };

        let coordinator = Arc::clone(self);
        self.tracker.spawn(async move {
            let _permit = permit;
            if let Err(e) = coordinator.run_broadcast(source).await {
                tracing::error!(error = %e, "broadcast failed");
            }
        });

        true
    }

    /// Shut down the coordinator
    ///
    /// Cancels every in-flight broadcast and waits up to the configured
    /// grace timeout for them to unwind. Broadcasts still running past the
    /// deadline are discarded with a warning. The delivery queue must be
    /// closed by the composition root only after this returns, so finished
    /// aggregations still reach the sink.
    pub async fn shutdown(&self) {
        let grace = self.config.shutdown_grace;
        tracing::info!(grace_ms = grace.as_millis() as u64, "fan-out coordinator shutting down");

        self.cancel.cancel();
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            tracing::warn!("shutdown grace elapsed, discarding in-flight broadcasts");
        }
    }
}
