//! Backing store collaborator
//!
//! A backing store is whatever holds the slowly-changing channel status
//! baseline: a conditions database, a calibration file, or an in-memory set of
//! snapshots. ChanGuard only needs two things from it:
//!
//! 1. Whether the data it last handed out still covers a cycle timestamp
//! 2. A fresh snapshot (rows plus validity interval) for a timestamp that is
//!    not covered
//!
//! Storage format, transport, retries and timeouts all live behind this trait.
//!
//! ## Module Organization
//!
//! - Core trait and row types (this file)
//! - `memory` - In-memory interval database for tests and embedded baselines

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::constants::STATUS_FIELD;
use crate::errors::FetchResult;
use crate::status::{ChannelId, Status};
use crate::time::{Timestamp, ValidityInterval};

pub mod memory;

pub use memory::MemoryBackingStore;

/// One channel's row as delivered by a backing store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    /// Channel the row belongs to
    pub channel: ChannelId,
    /// Named integer fields; the status code lives under `"status"`
    pub fields: BTreeMap<String, i64>,
}

impl StatusRow {
    /// Row with no fields
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            fields: BTreeMap::new(),
        }
    }

    /// Row carrying only a raw status code
    pub fn with_code(channel: ChannelId, code: i64) -> Self {
        Self::new(channel).field(STATUS_FIELD, code)
    }

    /// Row carrying the code of `status`
    pub fn with_status(channel: ChannelId, status: Status) -> Self {
        Self::with_code(channel, status.code())
    }

    /// Add a named field
    pub fn field(mut self, name: &str, value: i64) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Value of a named field
    pub fn get(&self, name: &str) -> Option<i64> {
        self.fields.get(name).copied()
    }

    /// Raw status code, if present
    pub fn status_code(&self) -> Option<i64> {
        self.get(STATUS_FIELD)
    }
}

/// Rows valid over one interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Interval the rows are valid for
    pub interval: ValidityInterval,
    /// One row per channel
    pub rows: Vec<StatusRow>,
}

impl Snapshot {
    /// Snapshot with no rows
    pub fn new(interval: ValidityInterval) -> Self {
        Self {
            interval,
            rows: Vec::new(),
        }
    }

    /// Append a row
    pub fn row(mut self, row: StatusRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Append a row for each `(channel, status)` pair
    pub fn statuses<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = (ChannelId, Status)>,
    {
        self.rows.extend(
            statuses
                .into_iter()
                .map(|(channel, status)| StatusRow::with_status(channel, status)),
        );
        self
    }
}

/// Source of interval-valid channel status snapshots
///
/// ## Implementation Requirements
///
/// - `covers()` must answer from the interval of the snapshot most recently
///   returned by `fetch()`, and must return `false` before the first fetch
/// - A failed `fetch()` must leave that cached interval untouched, so the next
///   cycle retries
/// - `fetch()` may block; there is no timeout at this layer
///
/// ## Example Implementation
///
/// ```rust
/// use changuard_core::backing::{BackingStore, Snapshot, StatusRow};
/// use changuard_core::errors::FetchResult;
/// use changuard_core::time::{Timestamp, ValidityInterval};
///
/// /// Baseline that never changes
/// struct Frozen {
///     loaded: bool,
/// }
///
/// impl BackingStore for Frozen {
///     fn covers(&self, _timestamp: Timestamp) -> bool {
///         self.loaded
///     }
///
///     fn fetch(&mut self, _timestamp: Timestamp) -> FetchResult<Snapshot> {
///         self.loaded = true;
///         Ok(Snapshot::new(ValidityInterval::unbounded()).row(StatusRow::with_code(0, 4)))
///     }
/// }
/// ```
pub trait BackingStore {
    /// Whether the cached interval covers `timestamp`
    fn covers(&self, timestamp: Timestamp) -> bool;

    /// Fetch the snapshot valid at `timestamp`
    fn fetch(&mut self, timestamp: Timestamp) -> FetchResult<Snapshot>;
}

impl<B: BackingStore + ?Sized> BackingStore for Box<B> {
    fn covers(&self, timestamp: Timestamp) -> bool {
        (**self).covers(timestamp)
    }

    fn fetch(&mut self, timestamp: Timestamp) -> FetchResult<Snapshot> {
        (**self).fetch(timestamp)
    }
}
