//! Single-shot pipeline demo
//!
//! Runs the whole broadcast pipeline once over a local image file with
//! local stand-in consumers: the archiver copies the stream into a temp
//! file, the extractor fakes a reading from the stream length.
//!
//! Run with: cargo run --example single_shot <IMAGE_FILE>

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use gaugecast::{
    delivery_queue, run_sink, BroadcastReader, ConsumerError, FanoutConfig, FanoutCoordinator,
    ImageArchiver, LatestReading, MeterReading, ReadingExtractor,
};

/// Archiver that stores the image in a local directory
struct FileArchiver {
    dir: PathBuf,
}

#[async_trait]
impl ImageArchiver for FileArchiver {
    async fn archive(
        &self,
        mut image: BroadcastReader,
        mime_type: &str,
    ) -> Result<String, ConsumerError> {
        let ext = if mime_type == "image/png" { "png" } else { "jpg" };
        let path = self.dir.join(format!("gauge_{}.{}", std::process::id(), ext));
        let mut file = tokio::fs::File::create(&path).await?;
        tokio::io::copy(&mut image, &mut file).await?;
        Ok(format!("file://{}", path.display()))
    }
}

/// Extractor stand-in that derives a fake reading from the stream length
struct ByteCountExtractor;

#[async_trait]
impl ReadingExtractor for ByteCountExtractor {
    async fn extract(
        &self,
        mut image: BroadcastReader,
    ) -> Result<Option<MeterReading>, ConsumerError> {
        let start = Instant::now();
        let mut bytes = Vec::new();
        image.read_to_end(&mut bytes).await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        let mut reading = MeterReading::new(format!("{:.1}", bytes.len() as f64 / 1024.0), "n/a");
        reading.elapsed_ms = Some(start.elapsed().as_millis() as u64);
        Ok(Some(reading))
    }
}

fn print_usage() {
    eprintln!("Usage: single_shot <IMAGE_FILE>");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let image_path = match args.get(1) {
        Some(path) => path.clone(),
        None => {
            print_usage();
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gaugecast=debug".parse()?),
        )
        .init();

    let (deliveries, receiver) = delivery_queue(10);
    let latest = Arc::new(LatestReading::new());
    let sink = tokio::spawn(run_sink(receiver, Arc::clone(&latest)));

    let coordinator = Arc::new(FanoutCoordinator::new(
        FanoutConfig::default(),
        Arc::new(FileArchiver {
            dir: std::env::temp_dir(),
        }),
        Arc::new(ByteCountExtractor),
        deliveries,
    ));

    println!("Reading image file: {}", image_path);
    let image = tokio::fs::File::open(&image_path).await?;
    let outcome = coordinator.run_broadcast(image).await?;
    println!("Broadcast outcome: {:?}", outcome);

    coordinator.shutdown().await;
    // Dropping the coordinator releases the queue so the sink can stop
    drop(coordinator);
    sink.await?;

    match latest.get().await {
        Some(value) => {
            println!(
                "Latest artifact: {}",
                serde_json::to_string_pretty(&value.artifact)?
            );
            println!("Numeric value: {:.3}", value.value);
        }
        None => println!("No value yet"),
    }

    Ok(())
}
