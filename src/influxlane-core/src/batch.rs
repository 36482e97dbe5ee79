//! Batching buffer for Line Protocol lines.
//!
//! Lines are queued per destination and a queue is handed back as a
//! [`Batch`] either when it fills up or when the owner drains everything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::line_protocol;
use crate::precision::WritePrecision;

/// One logical write target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DestinationKey {
    pub org: String,
    pub bucket: String,
    pub precision: WritePrecision,
}

impl DestinationKey {
    pub fn new(org: impl Into<String>, bucket: impl Into<String>, precision: WritePrecision) -> Self {
        Self {
            org: org.into(),
            bucket: bucket.into(),
            precision,
        }
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.org, self.bucket, self.precision)
    }
}

/// Lines drained from one destination queue, in append order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub destination: DestinationKey,
    pub lines: Vec<String>,
}

impl Batch {
    /// Request body for this batch
    pub fn body(&self) -> String {
        line_protocol::join_lines(&self.lines)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Per-destination queues of encoded lines.
///
/// Each queue is flushed on its own once it reaches `max_size`; every
/// other queue keeps accumulating until [`BatchBuffer::drain_all`].
pub struct BatchBuffer {
    queues: BTreeMap<DestinationKey, Vec<String>>,
    max_size: usize,
}

impl BatchBuffer {
    /// Create a new batch buffer. A `max_size` of zero is treated as one.
    pub fn new(max_size: usize) -> Self {
        Self {
            queues: BTreeMap::new(),
            max_size: max_size.max(1),
        }
    }

    /// Add a line to the queue of `destination`.
    ///
    /// Returns `Some(batch)` if that queue is now full and was drained,
    /// or `None` if there is still room.
    pub fn add(&mut self, destination: &DestinationKey, line: String) -> Option<Batch> {
        let max_size = self.max_size;
        let queue = self
            .queues
            .entry(destination.clone())
            .or_insert_with(|| Vec::with_capacity(max_size));
        queue.push(line);

        if queue.len() >= max_size {
            self.take(destination)
        } else {
            None
        }
    }

    /// Drain every non-empty queue.
    pub fn drain_all(&mut self) -> Vec<Batch> {
        std::mem::take(&mut self.queues)
            .into_iter()
            .filter(|(_, lines)| !lines.is_empty())
            .map(|(destination, lines)| Batch { destination, lines })
            .collect()
    }

    fn take(&mut self, destination: &DestinationKey) -> Option<Batch> {
        self.queues
            .remove(destination)
            .filter(|lines| !lines.is_empty())
            .map(|lines| Batch {
                destination: destination.clone(),
                lines,
            })
    }

    /// Total number of buffered lines across all destinations.
    pub fn len(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.queues.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(bucket: &str) -> DestinationKey {
        DestinationKey::new("my-org", bucket, WritePrecision::Ns)
    }

    #[test]
    fn test_batch_buffer_returns_none_until_full() {
        let mut buf = BatchBuffer::new(3);
        let d = dest("a");

        assert!(buf.add(&d, "line1".to_string()).is_none());
        assert_eq!(buf.len(), 1);

        assert!(buf.add(&d, "line2".to_string()).is_none());
        assert_eq!(buf.len(), 2);

        // Not full yet
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_batch_buffer_returns_batch_when_full() {
        let mut buf = BatchBuffer::new(3);
        let d = dest("a");

        buf.add(&d, "line1".to_string());
        buf.add(&d, "line2".to_string());

        let batch = buf.add(&d, "line3".to_string()).unwrap();
        assert_eq!(batch.destination, d);
        assert_eq!(batch.lines, vec!["line1", "line2", "line3"]);
        assert_eq!(batch.body(), "line1\nline2\nline3");

        // Buffer should be empty after flush
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_batch_buffer_queues_are_independent() {
        let mut buf = BatchBuffer::new(2);
        let a = dest("a");
        let b = dest("b");
        let a_seconds = DestinationKey::new("my-org", "a", WritePrecision::S);

        assert!(buf.add(&a, "a1".to_string()).is_none());
        assert!(buf.add(&b, "b1".to_string()).is_none());
        assert!(buf.add(&a_seconds, "s1".to_string()).is_none());

        let batch = buf.add(&b, "b2".to_string()).unwrap();
        assert_eq!(batch.destination, b);
        assert_eq!(batch.lines, vec!["b1", "b2"]);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_batch_buffer_drain_all() {
        let mut buf = BatchBuffer::new(100);
        buf.add(&dest("b"), "b1".to_string());
        buf.add(&dest("a"), "a1".to_string());
        buf.add(&dest("a"), "a2".to_string());

        let batches = buf.drain_all();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].destination, dest("a"));
        assert_eq!(batches[0].lines, vec!["a1", "a2"]);
        assert_eq!(batches[1].lines, vec!["b1"]);

        assert!(buf.is_empty());
        assert!(buf.drain_all().is_empty());
    }

    #[test]
    fn test_batch_buffer_zero_size_flushes_every_line() {
        let mut buf = BatchBuffer::new(0);
        let batch = buf.add(&dest("a"), "x".to_string()).unwrap();
        assert_eq!(batch.len(), 1);
    }
}
