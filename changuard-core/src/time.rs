//! Cycle time and validity intervals
//!
//! Every processing cycle carries a timestamp. Cached calibration data is
//! valid over a half-open interval of those timestamps:
//! - `begin` is the first covered timestamp
//! - `end` is the first timestamp that is *not* covered

#[cfg(feature = "serde")]
use serde::Serialize;

/// Cycle timestamp (opaque monotonic units supplied by the host)
pub type Timestamp = u64;

/// Half-open interval `[begin, end)` over which cached data stays correct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ValidityInterval {
    begin: Timestamp,
    end: Timestamp,
}

impl ValidityInterval {
    /// Create an interval, swapping the bounds if they arrive reversed
    pub fn new(begin: Timestamp, end: Timestamp) -> Self {
        let (begin, end) = if begin > end { (end, begin) } else { (begin, end) };
        Self { begin, end }
    }

    /// Interval that covers nothing; forces a fetch on the first cycle
    pub const fn empty() -> Self {
        Self { begin: 0, end: 0 }
    }

    /// Interval covering every timestamp
    pub const fn unbounded() -> Self {
        Self { begin: 0, end: Timestamp::MAX }
    }

    /// First covered timestamp
    pub fn begin(&self) -> Timestamp {
        self.begin
    }

    /// First timestamp past the interval
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// `begin <= t < end`
    pub fn covers(&self, timestamp: Timestamp) -> bool {
        self.begin <= timestamp && timestamp < self.end
    }

    /// True when no timestamp is covered
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

impl Default for ValidityInterval {
    fn default() -> Self {
        Self::empty()
    }
}
