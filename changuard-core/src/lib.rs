//! Channel status tracking for ChanGuard
//!
//! Answers "is this readout channel usable right now?" for a detector with
//! thousands of channels. Two layers feed the answer:
//!
//! - a persistent baseline (dead, low-noise, disconnected, noisy, good)
//!   seeded from defaults or refreshed from a conditions database / file
//!   whenever the cycle timestamp leaves its validity interval
//! - a per-cycle overlay of channels flagged noisy from their own raw
//!   waveforms, using a histogram-truncated RMS
//!
//! Key constraints:
//! - Builds `no_std + alloc`; logging and JSON configuration come with `std`
//! - A failed refresh never leaves a partially-filled baseline
//! - Bad or disconnected channels never receive a noisy verdict
//!
//! ```rust
//! use changuard_core::{ChannelStatusStore, PlaneGeometry, ProviderConfig, Status};
//!
//! let geometry = PlaneGeometry::new(&[2400, 2400, 3456]);
//! let mut store = ChannelStatusStore::new(&ProviderConfig::default(), &geometry, None)?;
//!
//! store.update(1);
//! assert_eq!(store.lookup(100), Status::Good);
//! assert!(store.is_present(100) && !store.is_bad(100));
//! # Ok::<(), changuard_core::ConfigError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod backing;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod digits;
pub mod errors;
pub mod geometry;
pub mod service;
pub mod stats;
pub mod status;
pub mod store;
pub mod table;
pub mod time;
pub mod update;

// Public API
pub use backing::{BackingStore, MemoryBackingStore, Snapshot, StatusRow};
pub use classifier::{ClassifierStats, NoisyChannelClassifier};
pub use config::{FilterConfig, ProviderConfig};
pub use digits::{DigitSource, RawDigit, Sample};
pub use errors::{ConfigError, ConfigResult, FetchError, FetchResult};
pub use geometry::{Category, ChannelGeometry, PlaneGeometry};
pub use service::{ChannelFilterService, CycleReport};
pub use stats::{robust_stats, RobustStats};
pub use status::{ChannelId, Status, StatusRecord};
pub use store::{ChannelSet, ChannelStatusStore};
pub use table::StatusTable;
pub use time::{Timestamp, ValidityInterval};
pub use update::{DataSource, UpdateOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
