//! # gaugecast
//!
//! Duplicates one binary stream (a gauge image) to independent,
//! concurrently-running consumers without buffering the whole stream in
//! memory, joins their outcomes, and exposes the most recent aggregated
//! reading.
//!
//! # Pipeline
//!
//! ```text
//!  source stream ──► broadcast pipe ──► archive consumer  ─┐
//!                         │                                ├─ join
//!                         └──────────► extract consumer  ──┘
//!                                                           │
//!                                                   GaugeArtifact
//!                                                           │
//!                                        bounded delivery queue
//!                                                           │
//!                                            latest-value sink
//! ```
//!
//! The broadcast pipe gives each consumer its own back-pressured lane: a
//! slow consumer blocks the writer rather than corrupting or starving its
//! sibling, and a consumer that dies early only faults its own lane. The
//! fan-out coordinator joins both consumers before deciding anything; the
//! extracted reading is required, the archival reference is best-effort.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gaugecast::{
//!     delivery_queue, run_sink, FanoutConfig, FanoutCoordinator, LatestReading,
//! };
//!
//! # async fn example(
//! #     archiver: Arc<dyn gaugecast::ImageArchiver>,
//! #     extractor: Arc<dyn gaugecast::ReadingExtractor>,
//! # ) -> gaugecast::Result<()> {
//! let (deliveries, receiver) = delivery_queue(10);
//! let latest = Arc::new(LatestReading::new());
//! let sink = tokio::spawn(run_sink(receiver, Arc::clone(&latest)));
//!
//! let coordinator = Arc::new(FanoutCoordinator::new(
//!     FanoutConfig::default(),
//!     archiver,
//!     extractor,
//!     deliveries,
//! ));
//!
//! let image = tokio::fs::File::open("gauge.jpg").await?;
//! coordinator.run_broadcast(image).await?;
//!
//! coordinator.shutdown().await;
//! drop(coordinator);
//! sink.await.ok();
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod delivery;
pub mod error;
pub mod fanout;
pub mod reading;
pub mod sink;

pub use broadcast::{
    broadcast_copy, broadcast_pair, broadcast_pipe, broadcast_pipe_with, BroadcastError,
    BroadcastReader, BroadcastWriter, LaneFault, WriteReport,
};
pub use delivery::{delivery_queue, DeliveryError, DeliveryReceiver, DeliverySender};
pub use error::{Error, Result};
pub use fanout::{
    AbandonReason, BroadcastOutcome, BroadcastPhase, ConsumerError, FanoutConfig,
    FanoutCoordinator, FanoutSnapshot, ImageArchiver, ReadingExtractor,
};
pub use reading::{GaugeArtifact, MeterReading};
pub use sink::{run_sink, LatestReading, SensorValue};
