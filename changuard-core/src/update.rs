//! Persistent table refresh protocol
//!
//! ## State Machine
//!
//! The data source is chosen once from configuration and never changes:
//!
//! ```text
//!                  ┌──────────── Default ──────────────┐
//! update(t) ──────►│ table seeded at construction,     │──► StaticDefaults
//!                  │ never touched again               │
//!                  └───────────────────────────────────┘
//!                  ┌──── File / Database ──────────────┐
//!                  │ covers(t)? ──yes──────────────────│──► Cached
//!                  │   │no                             │
//!                  │ fetch(t) ──ok──► swap new table ──│──► Refreshed
//!                  │   │err                            │
//!                  │ keep old table and interval ──────│──► RefreshFailed
//!                  └───────────────────────────────────┘
//! ```
//!
//! A refresh builds the replacement table completely before swapping it in,
//! so no reader ever sees a half-populated baseline. Clearing the overlay is
//! the store's job and happens before the protocol runs.

use crate::backing::{BackingStore, Snapshot};
use crate::config::ProviderConfig;
use crate::errors::{ConfigError, ConfigResult, FetchError, FetchResult};
use crate::status::{Status, StatusRecord};
use crate::table::StatusTable;
use crate::time::{Timestamp, ValidityInterval};

/// Origin of the persistent status table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Uniform status seeded from the geometry
    Default,
    /// Calibration file through a backing store
    File,
    /// Conditions database through a backing store
    Database,
}

impl DataSource {
    /// Database wins over file, file over defaults
    pub fn from_config(config: &ProviderConfig) -> Self {
        if config.use_database {
            DataSource::Database
        } else if config.use_file {
            DataSource::File
        } else {
            DataSource::Default
        }
    }

    /// Whether this source refreshes through a backing store
    pub fn is_backed(&self) -> bool {
        !matches!(self, DataSource::Default)
    }

    /// Short name for logs and errors
    pub const fn name(&self) -> &'static str {
        match self {
            DataSource::Default => "default",
            DataSource::File => "file",
            DataSource::Database => "database",
        }
    }
}

/// Result of one `update()` call
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Default source; the persistent table is static
    StaticDefaults,
    /// Timestamp already covered by the cached interval
    Cached {
        /// Interval of the table in use
        interval: ValidityInterval,
    },
    /// Persistent table replaced
    Refreshed {
        /// Interval of the new table
        interval: ValidityInterval,
        /// Number of records in the new table
        rows: usize,
    },
    /// Fetch failed; the previous table stays in use
    RefreshFailed(FetchError),
}

impl UpdateOutcome {
    /// True only when the persistent table was replaced
    pub fn refreshed(&self) -> bool {
        matches!(self, UpdateOutcome::Refreshed { .. })
    }

    /// True when a fetch was attempted and failed
    pub fn is_failure(&self) -> bool {
        matches!(self, UpdateOutcome::RefreshFailed(_))
    }
}

/// Decides when to refresh the persistent table and performs the refresh
#[derive(Debug)]
pub struct UpdateProtocol<B> {
    source: DataSource,
    /// Present exactly when `source.is_backed()`
    backing: Option<B>,
}

impl<B: BackingStore> UpdateProtocol<B> {
    /// Protocol for `source`; backed sources require a store
    pub fn new(source: DataSource, backing: Option<B>) -> ConfigResult<Self> {
        if !source.is_backed() {
            if backing.is_some() {
                log_debug!("Default data source: ignoring supplied backing store");
            }
            return Ok(Self { source, backing: None });
        }

        match backing {
            Some(backing) => Ok(Self { source, backing: Some(backing) }),
            None => Err(ConfigError::MissingBackingStore { mode: source.name() }),
        }
    }

    /// Selected data source
    pub fn source(&self) -> DataSource {
        self.source
    }

    /// The backing store, if the source uses one
    pub fn backing_store(&self) -> Option<&B> {
        self.backing.as_ref()
    }

    /// Mutable access to the backing store
    pub fn backing_store_mut(&mut self) -> Option<&mut B> {
        self.backing.as_mut()
    }

    /// Bring `persistent` up to date for `timestamp`
    pub fn run(&mut self, timestamp: Timestamp, persistent: &mut StatusTable) -> UpdateOutcome {
        let backing = match self.backing.as_mut() {
            Some(backing) => backing,
            None => return UpdateOutcome::StaticDefaults,
        };

        // a snapshot the store cached but we rejected must be fetched again
        if backing.covers(timestamp) && persistent.interval().covers(timestamp) {
            return UpdateOutcome::Cached { interval: persistent.interval() };
        }

        match backing.fetch(timestamp).and_then(build_table) {
            Ok(table) => {
                let interval = table.interval();
                let rows = table.len();
                *persistent = table;
                log_info!(
                    "Channel status refreshed from {}: {} rows valid [{}, {})",
                    self.source.name(),
                    rows,
                    interval.begin(),
                    interval.end()
                );
                UpdateOutcome::Refreshed { interval, rows }
            }
            Err(err) => {
                log_warn!(
                    "Channel status refresh at {} failed, keeping previous table: {}",
                    timestamp,
                    err
                );
                UpdateOutcome::RefreshFailed(err)
            }
        }
    }
}

/// Translate fetched rows into a complete replacement table
fn build_table(snapshot: Snapshot) -> FetchResult<StatusTable> {
    let mut table = StatusTable::with_interval(snapshot.interval);

    for row in &snapshot.rows {
        let code = row.status_code().ok_or(FetchError::MissingField {
            channel: row.channel,
            field: crate::constants::STATUS_FIELD,
        })?;

        let status = Status::from_code(code);
        if !Status::is_known_code(code) {
            log_warn!(
                "Channel {} has unrecognized status code {}, treating as unknown",
                row.channel,
                code
            );
        }

        table.add_or_replace(StatusRecord::new(row.channel, status));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::{MemoryBackingStore, StatusRow};

    fn protocol(snapshots: impl IntoIterator<Item = Snapshot>) -> UpdateProtocol<MemoryBackingStore> {
        UpdateProtocol::new(
            DataSource::Database,
            Some(MemoryBackingStore::with_snapshots(snapshots)),
        )
        .unwrap()
    }

    #[test]
    fn source_priority() {
        let both = ProviderConfig { use_database: true, use_file: true, ..Default::default() };
        assert_eq!(DataSource::from_config(&both), DataSource::Database);
        assert_eq!(DataSource::from_config(&ProviderConfig::file()), DataSource::File);
        assert_eq!(DataSource::from_config(&ProviderConfig::default()), DataSource::Default);
    }

    #[test]
    fn backed_source_requires_store() {
        let result = UpdateProtocol::<MemoryBackingStore>::new(DataSource::File, None);
        assert!(matches!(
            result,
            Err(ConfigError::MissingBackingStore { mode: "file" })
        ));
    }

    #[test]
    fn default_source_never_fetches() {
        let mut protocol =
            UpdateProtocol::new(DataSource::Default, Some(MemoryBackingStore::new())).unwrap();
        let mut table = StatusTable::uniform(0..3, Status::Good);

        assert_eq!(protocol.run(10, &mut table), UpdateOutcome::StaticDefaults);
        assert!(protocol.backing_store().is_none());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn covered_timestamp_is_a_cache_hit() {
        let mut protocol = protocol([
            Snapshot::new(ValidityInterval::new(0, 100)).statuses([(0, Status::Good)]),
        ]);
        let mut table = StatusTable::new();

        assert!(protocol.run(10, &mut table).refreshed());
        assert_eq!(
            protocol.run(20, &mut table),
            UpdateOutcome::Cached { interval: ValidityInterval::new(0, 100) }
        );
        assert_eq!(protocol.backing_store().unwrap().fetch_count(), 1);
    }

    #[test]
    fn refresh_replaces_rather_than_merges() {
        let mut protocol = protocol([
            Snapshot::new(ValidityInterval::new(0, 100))
                .statuses([(0, Status::Good), (1, Status::Dead)]),
            Snapshot::new(ValidityInterval::new(100, 200)).statuses([(0, Status::Noisy)]),
        ]);
        let mut table = StatusTable::new();

        protocol.run(10, &mut table);
        assert_eq!(table.len(), 2);

        let outcome = protocol.run(150, &mut table);
        assert_eq!(
            outcome,
            UpdateOutcome::Refreshed { interval: ValidityInterval::new(100, 200), rows: 1 }
        );
        assert_eq!(table.status(0), Some(Status::Noisy));
        assert_eq!(table.status(1), None);
    }

    #[test]
    fn unknown_code_maps_to_unknown() {
        let mut protocol = protocol([Snapshot::new(ValidityInterval::new(0, 100))
            .row(StatusRow::with_code(5, 99))]);
        let mut table = StatusTable::new();

        protocol.run(0, &mut table);
        assert_eq!(table.status(5), Some(Status::Unknown));
    }

    #[test]
    fn row_without_status_fails_whole_refresh() {
        let mut protocol = protocol([Snapshot::new(ValidityInterval::new(0, 100))
            .row(StatusRow::with_status(0, Status::Dead))
            .row(StatusRow::new(1).field("gain", 14))]);
        let mut table = StatusTable::uniform(0..2, Status::Good);
        let before = table.clone();

        let outcome = protocol.run(0, &mut table);
        assert_eq!(
            outcome,
            UpdateOutcome::RefreshFailed(FetchError::MissingField { channel: 1, field: "status" })
        );
        assert_eq!(table, before);

        // rejected snapshot is retried on the next cycle
        assert!(protocol.run(1, &mut table).is_failure());
        assert_eq!(protocol.backing_store().unwrap().fetch_count(), 2);
    }
}
