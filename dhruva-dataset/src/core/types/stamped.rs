//! Sequenced, timestamped wrapper for log records.

use serde::{Deserialize, Serialize};

/// A payload with its position in the log and its capture time.
///
/// `seq` increases monotonically within one log. Timestamps are in
/// microseconds since epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamped<T> {
    /// The wrapped data
    pub data: T,
    /// Sequence number within the log
    pub seq: u64,
    /// Timestamp in microseconds since epoch
    pub timestamp_us: u64,
}

impl<T> Stamped<T> {
    #[inline]
    pub fn new(data: T, seq: u64, timestamp_us: u64) -> Self {
        Self {
            data,
            seq,
            timestamp_us,
        }
    }

    /// Map the inner data while preserving sequence and timestamp.
    #[inline]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Stamped<U> {
        Stamped {
            data: f(self.data),
            seq: self.seq,
            timestamp_us: self.timestamp_us,
        }
    }
}
