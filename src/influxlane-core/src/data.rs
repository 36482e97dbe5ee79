//! Write input normalization.
//!
//! Every accepted input shape funnels through [`WriteData::to_lines`], which
//! produces the encoded lines in input order and drops empty entries.

use crate::error::PointError;
use crate::line_protocol;
use crate::point::{Point, PointMap};
use crate::precision::WritePrecision;

/// Anything that can be handed to a write call.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteData {
    /// Ready line protocol, sent as is (may hold several lines)
    Raw(String),
    /// Builder-style point
    Point(Point),
    /// Associative `{name, tags, fields, time}` point
    Map(PointMap),
    /// Ordered collection; `None` entries are skipped
    Batch(Vec<Option<WriteData>>),
}

impl WriteData {
    /// Encode into line protocol lines using `precision` for instant timestamps.
    ///
    /// Validation runs over the whole input before anything is returned, so an
    /// invalid point anywhere in a collection yields no lines at all.
    pub fn to_lines(&self, precision: WritePrecision) -> Result<Vec<String>, PointError> {
        let mut lines = Vec::new();
        self.collect_lines(precision, &mut lines)?;
        Ok(lines)
    }

    /// Encode into a single request body (lines joined by `\n`).
    pub fn to_body(&self, precision: WritePrecision) -> Result<String, PointError> {
        Ok(line_protocol::join_lines(&self.to_lines(precision)?))
    }

    fn collect_lines(
        &self,
        precision: WritePrecision,
        lines: &mut Vec<String>,
    ) -> Result<(), PointError> {
        match self {
            WriteData::Raw(raw) => {
                let raw = raw.trim_end_matches(&['\n', '\r'][..]);
                if !raw.is_empty() {
                    lines.push(raw.to_string());
                }
            }
            WriteData::Point(point) => lines.push(point.to_line_protocol(precision)?),
            WriteData::Map(map) => {
                lines.push(Point::from(map.clone()).to_line_protocol(precision)?)
            }
            WriteData::Batch(items) => {
                for item in items.iter().flatten() {
                    item.collect_lines(precision, lines)?;
                }
            }
        }
        Ok(())
    }
}

impl From<&str> for WriteData {
    fn from(v: &str) -> Self {
        WriteData::Raw(v.to_string())
    }
}

impl From<String> for WriteData {
    fn from(v: String) -> Self {
        WriteData::Raw(v)
    }
}

impl From<Point> for WriteData {
    fn from(v: Point) -> Self {
        WriteData::Point(v)
    }
}

impl From<PointMap> for WriteData {
    fn from(v: PointMap) -> Self {
        WriteData::Map(v)
    }
}

impl<T: Into<WriteData>> From<Option<T>> for WriteData {
    fn from(v: Option<T>) -> Self {
        WriteData::Batch(vec![v.map(Into::into)])
    }
}

impl<T: Into<WriteData>> From<Vec<T>> for WriteData {
    fn from(v: Vec<T>) -> Self {
        WriteData::Batch(v.into_iter().map(|item| Some(item.into())).collect())
    }
}

impl<T: Into<WriteData>> FromIterator<T> for WriteData {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        WriteData::Batch(iter.into_iter().map(|item| Some(item.into())).collect())
    }
}
