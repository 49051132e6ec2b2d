//! Channel status classification
//!
//! A closed set of states describing whether a channel's data are usable.
//! External integer codes are mapped through an exhaustive match so that an
//! unrecognized code can never be mistaken for `Good`.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{
    CODE_DEAD, CODE_DISCONNECTED, CODE_GOOD, CODE_LOWNOISE, CODE_NOISY, CODE_UNKNOWN,
};

/// Readout channel identifier
pub type ChannelId = u32;

/// Usability of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Status {
    /// Not connected to readout; carries no data at all
    Disconnected,
    /// Connected but silent
    Dead,
    /// Suspiciously quiet, usually a failed front-end
    LowNoise,
    /// Dispersion above the category threshold
    Noisy,
    /// Usable
    Good,
    /// Not determined, or an unrecognized external code
    Unknown,
}

impl Status {
    /// Map an external status code, falling back to `Unknown`
    pub const fn from_code(code: i64) -> Self {
        match code {
            CODE_DISCONNECTED => Status::Disconnected,
            CODE_DEAD => Status::Dead,
            CODE_LOWNOISE => Status::LowNoise,
            CODE_NOISY => Status::Noisy,
            CODE_GOOD => Status::Good,
            _ => Status::Unknown,
        }
    }

    /// External code for this status
    pub const fn code(&self) -> i64 {
        match self {
            Status::Disconnected => CODE_DISCONNECTED,
            Status::Dead => CODE_DEAD,
            Status::LowNoise => CODE_LOWNOISE,
            Status::Noisy => CODE_NOISY,
            Status::Good => CODE_GOOD,
            Status::Unknown => CODE_UNKNOWN,
        }
    }

    /// True when `code` names one of the known states
    pub const fn is_known_code(code: i64) -> bool {
        !matches!(Status::from_code(code), Status::Unknown) || code == CODE_UNKNOWN
    }

    /// Channel has a readout connection
    pub const fn is_present(&self) -> bool {
        !matches!(self, Status::Disconnected)
    }

    /// Channel is known broken (dead or low-noise)
    pub const fn is_bad(&self) -> bool {
        matches!(self, Status::Dead | Status::LowNoise)
    }

    /// Human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            Status::Disconnected => "disconnected",
            Status::Dead => "dead",
            Status::LowNoise => "low_noise",
            Status::Noisy => "noisy",
            Status::Good => "good",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One channel's status within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusRecord {
    /// Channel this record describes
    pub channel: ChannelId,
    /// Its classification
    pub status: Status,
}

impl StatusRecord {
    /// Create a record
    pub const fn new(channel: ChannelId, status: Status) -> Self {
        Self { channel, status }
    }

    /// Record marking `channel` noisy
    pub const fn noisy(channel: ChannelId) -> Self {
        Self::new(channel, Status::Noisy)
    }
}
