//! Influxlane Client Library
//!
//! Writes points to an InfluxDB 2.x server through `/api/v2/write`, either one
//! request per call or batched in the background.
//!
//! ```rust,no_run
//! use influxlane_rs::{Client, ClientConfig, Point, WriteOptions};
//!
//! #[tokio::main]
//! async fn main() -> influxlane_rs::Result<()> {
//!     let config = ClientConfig::new("http://localhost:8086", "my-token", "my-org", "my-bucket");
//!     let client = Client::new(config)?;
//!     let write_api = client.create_write_api(WriteOptions::default());
//!
//!     write_api
//!         .write(Point::measurement("h2o").add_tag("location", "europe").add_field("level", 2))
//!         .await?;
//!     write_api.close().await
//! }
//! ```

mod client;
mod service;
mod transport;
mod worker;
mod write_api;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use transport::{HttpTransport, Transport, TransportResponse, WriteRequest};
pub use worker::ErrorCallback;
pub use write_api::{WriteApi, WriteParameters};

pub use influxlane_core::{
    Batch, ClientConfig, DestinationKey, FieldValue, Point, PointError, PointMap, RetryOptions,
    Timestamp, WriteData, WriteMode, WriteOptions, WritePrecision,
};

use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Invalid point: {0}")]
    InvalidPoint(#[from] PointError),

    #[error("HTTP request failed: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("Server error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Write API is closed")]
    Closed,
}

impl From<reqwest::Error> for WriteError {
    fn from(e: reqwest::Error) -> Self {
        WriteError::Transport(Box::new(e))
    }
}

impl WriteError {
    /// Connection failures, 429 and 503 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            WriteError::Transport(_) => true,
            WriteError::Api(e) => e.status == 429 || e.status == 503,
            _ => false,
        }
    }
}

/// A non-2xx response, kept exactly as the server sent it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status} - {}", String::from_utf8_lossy(.body))]
pub struct ApiError {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// The `{"code", "message"}` document InfluxDB returns on failures.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// First value of a response header, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as an InfluxDB error document
    pub fn error_body(&self) -> serde_json::Result<ErrorBody> {
        serde_json::from_slice(&self.body)
    }

    /// `Retry-After` in whole seconds
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

pub type Result<T> = std::result::Result<T, WriteError>;
