//! In-memory interval database
//!
//! Holds a set of snapshots keyed by validity interval and serves them the way
//! a conditions database would. Useful for:
//! - Unit and integration testing (fetch counting, failure injection)
//! - Embedding a fixed baseline in firmware
//! - Replaying a recorded run's calibration history

use alloc::vec::Vec;

use super::{BackingStore, Snapshot};
use crate::errors::{FetchError, FetchResult};
use crate::time::{Timestamp, ValidityInterval};

/// Backing store over snapshots held in memory
///
/// ## Example
///
/// ```rust
/// use changuard_core::backing::{BackingStore, MemoryBackingStore, Snapshot};
/// use changuard_core::status::Status;
/// use changuard_core::time::ValidityInterval;
///
/// let mut db = MemoryBackingStore::new();
/// db.insert(Snapshot::new(ValidityInterval::new(0, 100)).statuses([(0, Status::Good)]));
///
/// assert!(!db.covers(50));
/// let snapshot = db.fetch(50).unwrap();
/// assert_eq!(snapshot.rows.len(), 1);
/// assert!(db.covers(50));
/// assert_eq!(db.fetch_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackingStore {
    /// Snapshots sorted by interval begin
    snapshots: Vec<Snapshot>,
    /// Interval of the last snapshot handed out
    cached: Option<ValidityInterval>,
    /// Successful and failed fetch attempts
    fetches: usize,
    /// Error to return on the next fetch
    pending_failure: Option<FetchError>,
}

impl MemoryBackingStore {
    /// Empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Database preloaded with `snapshots`
    pub fn with_snapshots<I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = Snapshot>,
    {
        let mut store = Self::new();
        for snapshot in snapshots {
            store.insert(snapshot);
        }
        store
    }

    /// Add a snapshot; later inserts win where intervals overlap
    pub fn insert(&mut self, snapshot: Snapshot) {
        // stable position after every snapshot with begin <= this one
        let begin = snapshot.interval.begin();
        let at = self
            .snapshots
            .partition_point(|s| s.interval.begin() <= begin);
        self.snapshots.insert(at, snapshot);
    }

    /// Make the next fetch fail with `error`
    pub fn fail_next_fetch(&mut self, error: FetchError) {
        self.pending_failure = Some(error);
    }

    /// Number of fetch attempts so far
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Interval of the snapshot last handed out
    pub fn cached_interval(&self) -> Option<ValidityInterval> {
        self.cached
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True when no snapshots are stored
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn find(&self, timestamp: Timestamp) -> Option<&Snapshot> {
        // latest-begin snapshot that still covers the timestamp
        self.snapshots
            .iter()
            .rev()
            .find(|s| s.interval.covers(timestamp))
    }
}

impl BackingStore for MemoryBackingStore {
    fn covers(&self, timestamp: Timestamp) -> bool {
        self.cached.map_or(false, |iov| iov.covers(timestamp))
    }

    fn fetch(&mut self, timestamp: Timestamp) -> FetchResult<Snapshot> {
        self.fetches += 1;

        if let Some(error) = self.pending_failure.take() {
            return Err(error);
        }

        let snapshot = self
            .find(timestamp)
            .cloned()
            .ok_or(FetchError::NoData { timestamp })?;

        self.cached = Some(snapshot.interval);
        Ok(snapshot)
    }
}
