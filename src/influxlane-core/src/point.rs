use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::PointError;
use crate::line_protocol;
use crate::precision::WritePrecision;

/// A value that can be stored in an InfluxDB field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

impl FieldValue {
    /// Format this value for InfluxDB Line Protocol.
    ///
    /// - Float: shortest round-trip form (e.g., `3.14`, `2` for `2.0`)
    /// - Integer: suffixed with `i` (e.g., `42i`)
    /// - String: quoted with double quotes, `\` and `"` escaped (e.g., `"hello"`)
    /// - Boolean: `true` or `false`
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::Float(v) => format!("{}", v),
            FieldValue::Integer(v) => format!("{}i", v),
            FieldValue::String(v) => format!("\"{}\"", line_protocol::escape_string_field(v)),
            FieldValue::Boolean(v) => {
                if *v {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
        }
    }

    /// NaN and infinite floats have no line protocol representation.
    pub fn is_writable(&self) -> bool {
        match self {
            FieldValue::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line_protocol())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v.into())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

/// Point time: either an integer already expressed in the write precision,
/// or an instant converted when the point is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Raw(i64),
    Instant(DateTime<Utc>),
}

impl Timestamp {
    pub fn in_precision(&self, precision: WritePrecision) -> i64 {
        match self {
            Timestamp::Raw(v) => *v,
            Timestamp::Instant(t) => precision.timestamp_of(t),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(v: i64) -> Self {
        Timestamp::Raw(v)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(v: DateTime<Utc>) -> Self {
        Timestamp::Instant(v)
    }
}

/// A single data point built through explicit setters.
///
/// Tags and fields are kept sorted by key so the encoded series key is
/// canonical regardless of the order they were added in.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    name: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    time: Option<Timestamp>,
}

impl Point {
    /// Start a point for the given measurement
    pub fn measurement(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            time: None,
        }
    }

    /// Add a tag, replacing any previous value for the same key
    pub fn add_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field, replacing any previous value for the same key
    pub fn add_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn time(mut self, time: impl Into<Timestamp>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.time
    }

    /// Check the point can be encoded, applying the same filtering as the encoder
    pub fn validate(&self) -> Result<(), PointError> {
        if self.name.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }
        if self.writable_fields().next().is_none() {
            return Err(PointError::NoFields {
                measurement: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Render this point as one line of line protocol
    pub fn to_line_protocol(&self, precision: WritePrecision) -> Result<String, PointError> {
        line_protocol::encode_point(self, precision)
    }

    /// Tags with an empty key or value are not sent.
    pub(crate) fn writable_tags(&self) -> impl Iterator<Item = (&String, &String)> {
        self.tags
            .iter()
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
    }

    pub(crate) fn writable_fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields
            .iter()
            .filter(|(k, v)| !k.is_empty() && v.is_writable())
    }
}

/// Associative form of a point: `{name, tags, fields, time}`.
///
/// Deserializes straight from JSON objects such as
/// `{"name": "h2o", "tags": {"host": "aws"}, "fields": {"level": 5}, "time": 123}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointMap {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

impl From<PointMap> for Point {
    fn from(map: PointMap) -> Self {
        Point {
            name: map.name,
            tags: map.tags,
            fields: map.fields,
            time: map.time.map(Timestamp::Raw),
        }
    }
}
