//! Influxlane Core Library
//!
//! This crate provides the I/O-free half of the InfluxDB write pipeline:
//! - Point model and write precision
//! - Line protocol encoding
//! - Normalization of raw lines, points, maps and mixed collections
//! - Per-destination batch buffering
//! - Client and write configuration

pub mod batch;
pub mod config;
pub mod data;
pub mod error;
pub mod line_protocol;
pub mod point;
pub mod precision;

// Re-export commonly used types
pub use batch::{Batch, BatchBuffer, DestinationKey};
pub use config::{ClientConfig, RetryOptions, WriteMode, WriteOptions};
pub use data::WriteData;
pub use error::PointError;
pub use point::{FieldValue, Point, PointMap, Timestamp};
pub use precision::WritePrecision;
