use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time unit of a line protocol timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum WritePrecision {
    #[default]
    Ns,
    Us,
    Ms,
    S,
}

impl WritePrecision {
    /// Value of the `precision` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            WritePrecision::Ns => "ns",
            WritePrecision::Us => "us",
            WritePrecision::Ms => "ms",
            WritePrecision::S => "s",
        }
    }

    /// Convert an instant to an integer timestamp in this precision.
    ///
    /// Nanoseconds saturate at the `i64` range (years 1677..2262).
    pub fn timestamp_of(&self, time: &DateTime<Utc>) -> i64 {
        match self {
            WritePrecision::Ns => time.timestamp_nanos_opt().unwrap_or(if time.timestamp() < 0 {
                i64::MIN
            } else {
                i64::MAX
            }),
            WritePrecision::Us => time.timestamp_micros(),
            WritePrecision::Ms => time.timestamp_millis(),
            WritePrecision::S => time.timestamp(),
        }
    }
}

impl fmt::Display for WritePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown write precision '{0}', expected one of ns, us, ms, s")]
pub struct ParsePrecisionError(pub String);

impl FromStr for WritePrecision {
    type Err = ParsePrecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ns" => Ok(WritePrecision::Ns),
            "us" => Ok(WritePrecision::Us),
            "ms" => Ok(WritePrecision::Ms),
            "s" => Ok(WritePrecision::S),
            _ => Err(ParsePrecisionError(s.to_string())),
        }
    }
}
