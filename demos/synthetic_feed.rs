//! Synthetic feed demo
//!
//! Drives the pipeline the way a message-bus subscription would: a new
//! in-memory frame every 500ms, one broadcast per frame, bounded in-flight
//! concurrency, graceful Ctrl+C shutdown.
//!
//! Run with: cargo run --example synthetic_feed

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use gaugecast::{
    delivery_queue, run_sink, BroadcastReader, ConsumerError, FanoutConfig, FanoutCoordinator,
    ImageArchiver, LatestReading, MeterReading, ReadingExtractor,
};

/// Archiver stand-in that only counts what it stored
struct MemoryArchiver {
    stored: AtomicU64,
}

#[async_trait]
impl ImageArchiver for MemoryArchiver {
    async fn archive(
        &self,
        mut image: BroadcastReader,
        _mime_type: &str,
    ) -> Result<String, ConsumerError> {
        let mut sink = tokio::io::sink();
        tokio::io::copy(&mut image, &mut sink).await?;
        let n = self.stored.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("mem://frames/{}", n))
    }
}

/// Extractor stand-in that reads the frame's sequence byte as the value
struct PatternExtractor;

#[async_trait]
impl ReadingExtractor for PatternExtractor {
    async fn extract(
        &self,
        mut image: BroadcastReader,
    ) -> Result<Option<MeterReading>, ConsumerError> {
        let mut bytes = Vec::new();
        image.read_to_end(&mut bytes).await?;
        match bytes.first() {
            Some(seq) => Ok(Some(MeterReading::new(format!("{}.0", seq), "2025-01-01"))),
            None => Ok(None),
        }
    }
}

fn frame(seq: u8) -> std::io::Cursor<Vec<u8>> {
    std::io::Cursor::new(vec![seq; 4096])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gaugecast=info".parse()?),
        )
        .init();

    let (deliveries, receiver) = delivery_queue(10);
    let latest = Arc::new(LatestReading::new());
    let sink = tokio::spawn(run_sink(receiver, Arc::clone(&latest)));

    let config = FanoutConfig::default()
        .max_in_flight(4)
        .shutdown_grace(Duration::from_secs(2));
    let coordinator = Arc::new(FanoutCoordinator::new(
        config,
        Arc::new(MemoryArchiver {
            stored: AtomicU64::new(0),
        }),
        Arc::new(PatternExtractor),
        deliveries,
    ));

    println!("Feeding synthetic frames. Press Ctrl+C to stop.");

    let mut seq: u8 = 0;
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                seq = seq.wrapping_add(1);
                coordinator.spawn_broadcast(frame(seq));
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    coordinator.shutdown().await;
    let stats = coordinator.stats();
    drop(coordinator);
    sink.await?;

    println!(
        "Stats: started={} aggregated={} abandoned={} rejected={} bytes={}",
        stats.started, stats.aggregated, stats.abandoned, stats.rejected, stats.bytes_copied,
    );
    match latest.get().await {
        Some(value) => println!("Last reading: {} ({:.1})", value.artifact.reading.read, value.value),
        None => println!("No value recorded"),
    }

    Ok(())
}
