//! InfluxDB v2 Line Protocol encoder.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::error::PointError;
use crate::point::Point;
use crate::precision::WritePrecision;

/// Encode one point. Fails without producing any output if the point is invalid.
pub fn encode_point(point: &Point, precision: WritePrecision) -> Result<String, PointError> {
    point.validate()?;

    let mut line = escape_measurement(point.name());

    // Tags are already sorted by key
    for (key, value) in point.writable_tags() {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    // Space separator before fields
    line.push(' ');

    let mut written = 0;
    for (key, value) in point.writable_fields() {
        if written > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&value.to_line_protocol());
        written += 1;
    }
    if written < point.fields().len() {
        tracing::debug!(
            measurement = %point.name(),
            skipped = point.fields().len() - written,
            "Dropped fields with empty keys or non-finite values"
        );
    }

    if let Some(time) = point.timestamp() {
        line.push(' ');
        line.push_str(&time.in_precision(precision).to_string());
    }

    Ok(line)
}

/// Join encoded lines into a request body: single `\n` separator, no trailing newline.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut body = String::with_capacity(lines.iter().map(|l| l.as_ref().len() + 1).sum());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            body.push('\n');
        }
        body.push_str(line.as_ref());
    }
    body
}

/// Escape measurement name. Spaces and commas must be escaped with backslash.
pub fn escape_measurement(s: &str) -> String {
    escape(s, &[',', ' '])
}

/// Escape tag key, tag value or field key.
/// Commas, equals signs, and spaces must be escaped.
pub fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

/// Escape the contents of a string field value (quotes are added by the caller).
pub fn escape_string_field(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape(s: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if reserved.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}
