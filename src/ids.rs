//! Identifier generation for tracked uploads.

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

/// Unique identifier of a tracked upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UploadId(pub u64);

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of upload identifiers.
pub trait IdGenerator {
    /// Produce an identifier not returned before by this generator.
    fn next_id(&mut self) -> UploadId;
}

/// Deterministic counter starting at 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    last: u64,
}

impl SequentialIds {
    /// Create a counter starting at 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> UploadId {
        self.last += 1;
        UploadId(self.last)
    }
}

/// Wall-clock based identifiers: milliseconds since the Unix epoch, bumped
/// so that every id is strictly greater than the previous one.
#[derive(Debug, Clone, Default)]
pub struct TimestampIds {
    last: u64,
}

impl TimestampIds {
    /// Create a generator.
    pub fn new() -> Self {
        Self::default()
    }

    fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&mut self) -> UploadId {
        let candidate = Self::now_millis().max(self.last.saturating_add(1));
        self.last = candidate;
        UploadId(candidate)
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn next_id(&mut self) -> UploadId {
        (**self).next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.next_id(), UploadId(1));
        assert_eq!(ids.next_id(), UploadId(2));
    }

    #[test]
    fn test_timestamp_ids_are_strictly_increasing() {
        let mut ids = TimestampIds::new();
        let mut previous = ids.next_id();
        for _ in 0..1000 {
            let id = ids.next_id();
            assert!(id > previous);
            previous = id;
        }
    }
}
