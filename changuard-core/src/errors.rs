//! Error Types for Channel Status Tracking
//!
//! ## Design Philosophy
//!
//! Most failure modes in channel status tracking are *not* errors from the
//! caller's point of view:
//!
//! - A channel unknown to both tables reads back as [`Status::Unknown`].
//! - An unrecognized status code from the backing store maps to `Unknown`.
//! - A failed refresh keeps the last good table and is reported through
//!   [`UpdateOutcome`], never raised.
//! - A cycle without raw samples simply classifies nothing.
//!
//! What remains are two small enums:
//!
//! ### Configuration Problems
//! - [`ConfigError`]: rejected at construction, before any cycle runs.
//!
//! ### Backing Store Failures
//! - [`FetchError`]: produced by a [`BackingStore`] implementation and carried
//!   inside [`UpdateOutcome::RefreshFailed`] so the host can log it.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use changuard_core::{ChannelStatusStore, ProviderConfig, PlaneGeometry, UpdateOutcome};
//!
//! let geometry = PlaneGeometry::new(&[4, 4, 8]);
//! let mut store = ChannelStatusStore::new(&ProviderConfig::default(), &geometry, None)?;
//!
//! match store.update(1_000) {
//!     UpdateOutcome::Refreshed { .. } => {
//!         // new baseline in place
//!     }
//!     UpdateOutcome::RefreshFailed(err) => {
//!         // keep running on the stale baseline
//!         let _ = err;
//!     }
//!     _ => {
//!         // cache hit or static defaults
//!     }
//! }
//! # Ok::<(), changuard_core::ConfigError>(())
//! ```
//!
//! [`Status::Unknown`]: crate::status::Status::Unknown
//! [`UpdateOutcome`]: crate::update::UpdateOutcome
//! [`UpdateOutcome::RefreshFailed`]: crate::update::UpdateOutcome::RefreshFailed
//! [`BackingStore`]: crate::backing::BackingStore

use alloc::string::String;

use thiserror_no_std::Error;

use crate::status::ChannelId;
use crate::time::Timestamp;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for backing store fetches
pub type FetchResult<T> = Result<T, FetchError>;

/// Configuration rejected before the store or classifier was built
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Truncation fraction must lie in `[0, 1)`
    #[error("Truncation fraction {value} outside [0, 1)")]
    TruncationFractionOutOfRange {
        /// The configured fraction
        value: f64,
    },

    /// At least one per-category threshold is required
    #[error("RMS threshold list is empty")]
    EmptyThresholds,

    /// More categories than the fixed-capacity threshold vector holds
    #[error("{count} RMS thresholds exceed capacity {max}")]
    TooManyCategories {
        /// Number of thresholds supplied
        count: usize,
        /// Capacity of the threshold vector
        max: usize,
    },

    /// Thresholds must be finite and non-negative
    #[error("RMS threshold {value} for category {category} is not a finite non-negative number")]
    InvalidThreshold {
        /// Category index of the offending entry
        category: usize,
        /// The offending value
        value: f64,
    },

    /// File or database mode was selected but no backing store was supplied
    #[error("Data source '{mode}' requires a backing store")]
    MissingBackingStore {
        /// Name of the selected data source
        mode: &'static str,
    },

    /// Configuration text could not be parsed
    #[error("Config parse error: {0}")]
    Parse(String),
}

/// Failure while fetching a snapshot from a backing store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Database or file could not be reached
    #[error("Backing store unreachable: {reason}")]
    Unreachable {
        /// Transport-level description
        reason: String,
    },

    /// No snapshot covers the requested timestamp
    #[error("No snapshot covers timestamp {timestamp}")]
    NoData {
        /// Requested cycle timestamp
        timestamp: Timestamp,
    },

    /// Payload could not be interpreted
    #[error("Malformed snapshot: {reason}")]
    Malformed {
        /// Parser description
        reason: String,
    },

    /// A row is missing a required named field
    #[error("Channel {channel} has no '{field}' field")]
    MissingField {
        /// Channel of the offending row
        channel: ChannelId,
        /// Name of the missing field
        field: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::TruncationFractionOutOfRange { value } =>
                defmt::write!(fmt, "Truncation fraction {} outside [0, 1)", value),
            Self::EmptyThresholds =>
                defmt::write!(fmt, "Empty RMS thresholds"),
            Self::TooManyCategories { count, max } =>
                defmt::write!(fmt, "{} thresholds exceed {}", count, max),
            Self::InvalidThreshold { category, value } =>
                defmt::write!(fmt, "Bad threshold {} for category {}", value, category),
            Self::MissingBackingStore { mode } =>
                defmt::write!(fmt, "Source {} needs a backing store", mode),
            Self::Parse(_) =>
                defmt::write!(fmt, "Config parse error"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FetchError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Unreachable { .. } =>
                defmt::write!(fmt, "Backing store unreachable"),
            Self::NoData { timestamp } =>
                defmt::write!(fmt, "No snapshot for {}", timestamp),
            Self::Malformed { .. } =>
                defmt::write!(fmt, "Malformed snapshot"),
            Self::MissingField { channel, field } =>
                defmt::write!(fmt, "Channel {} missing {}", channel, field),
        }
    }
}
