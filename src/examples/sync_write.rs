//! Synchronous Write Example
//!
//! Writes a raw line, a point, an associative map and a mixed collection,
//! one request per call.
//!
//! Run with: cargo run --example sync_write
//!
//! Reads `config.json` when present, e.g.
//! `{"url": "http://localhost:8086", "token": "my-token", "org": "my-org", "bucket": "my-bucket"}`

use chrono::Utc;
use influxlane_rs::*;
use std::collections::BTreeMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Console logging, overridable through RUST_LOG
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("influxlane_rs=debug,influxlane_core=debug"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()?;

    let config = ClientConfig::load("config.json").unwrap_or_else(|_| {
        tracing::warn!("Failed to load config.json, using defaults");
        ClientConfig::new("http://localhost:8086", "my-token", "my-org", "my-bucket")
    });

    let client = Client::new(config)?;
    let write_api = client.create_write_api(WriteOptions::synchronous());

    // Raw line protocol
    write_api
        .write_raw("h2o_feet,location=coyote_creek water_level=2.0 2")
        .await?;
    println!("✅ Raw line written");

    // Builder-style point, timestamp converted to seconds
    let point = Point::measurement("h2o")
        .add_tag("location", "europe")
        .add_field("level", 2)
        .add_field("ok", true)
        .time(Utc::now());
    write_api
        .write_with(point, WriteParameters::new().precision(WritePrecision::S))
        .await?;
    println!("✅ Point written");

    // Associative form
    let map: PointMap = serde_json::from_str(
        r#"{"name": "h2o", "tags": {"host": "aws", "region": "us"}, "fields": {"level": 5, "saturation": "99%"}, "time": 123}"#,
    )?;
    write_api.write(map.clone()).await?;
    println!("✅ Map written");

    // Mixed collection with a hole, sent as one request
    let batch = WriteData::Batch(vec![
        Some("h2o,location=west value=33i 15".into()),
        None,
        Some(Point::measurement("h2o").add_field("level", 3).into()),
        Some(map.into()),
    ]);
    match write_api.write(batch).await {
        Ok(()) => println!("✅ Collection written"),
        Err(WriteError::Api(e)) => {
            println!("❌ Server rejected the write: {}", e.status);
            if let Some(code) = e.header("X-Platform-Error-Code") {
                println!("   Error code: {}", code);
            }
            println!("   Body: {}", e.body_text());
        }
        Err(e) => return Err(e.into()),
    }

    write_api.close().await?;
    Ok(())
}
