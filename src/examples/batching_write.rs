//! Batching Write Example
//!
//! Queues points in the background and flushes them every 3 points or every
//! second, whichever comes first. Failed flushes are reported to a callback.
//!
//! Run with: cargo run --example batching_write

use influxlane_rs::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("influxlane_rs=info")),
        )
        .init();

    let config = ClientConfig::load("config.json").unwrap_or_else(|_| {
        ClientConfig::new("http://localhost:8086", "my-token", "my-org", "my-bucket")
    });
    let client = Client::new(config)?;

    let failures = Arc::new(AtomicUsize::new(0));
    let counter = failures.clone();
    let on_error: ErrorCallback = Arc::new(move |destination: &DestinationKey, error: &WriteError| {
        counter.fetch_add(1, Ordering::Relaxed);
        eprintln!("❌ Flush to {} failed: {}", destination, error);
    });

    let options = WriteOptions::batching(3, Duration::from_secs(1))
        .with_retry(RetryOptions::new(3, Duration::from_millis(500)));
    let write_api = client.create_write_api_with_error_callback(options, on_error);

    println!("📝 Writing 10 points in batches of 3...");
    for i in 1..=10i64 {
        let point = Point::measurement("h2o")
            .add_tag("host", "aws")
            .add_tag("region", "us")
            .add_field("level", i)
            .add_field("saturation", 100 - i)
            .time(i);
        write_api
            .write_with(point, WriteParameters::new().precision(WritePrecision::S))
            .await?;
    }

    // The last point is still queued; close flushes it
    write_api.close().await?;

    println!(
        "✅ Done, {} batch(es) failed",
        failures.load(Ordering::Relaxed)
    );
    Ok(())
}
