//! Channel Status Store
//!
//! ## Overview
//!
//! The store reconciles two independently owned tables:
//!
//! ```text
//!            ┌───────────────────────┐
//! lookup ──► │ overlay (this cycle)  │── hit ──► Noisy
//!            └──────────┬────────────┘
//!                       │ miss
//!            ┌──────────▼────────────┐
//!            │ persistent (baseline) │── hit ──► stored status
//!            └──────────┬────────────┘
//!                       │ miss
//!                       └──────────────────────► Unknown
//! ```
//!
//! - The **persistent** table is the slowly-changing baseline, either seeded
//!   once from the geometry or refreshed through a [`BackingStore`].
//! - The **overlay** is rebuilt every cycle by the noisy channel search and
//!   always wins over the baseline until the next [`update`] clears it.
//!
//! ## Overlay Invariant
//!
//! The overlay only ever holds `Noisy` records, and only for channels that are
//! present (not `Disconnected`) and not bad (not `Dead`/`LowNoise`) in the
//! persistent table at the time of the write. [`record_noisy`] enforces this
//! itself rather than trusting the caller.
//!
//! [`update`]: ChannelStatusStore::update
//! [`record_noisy`]: ChannelStatusStore::record_noisy

use alloc::boxed::Box;
use alloc::collections::BTreeSet;

use crate::backing::BackingStore;
use crate::config::ProviderConfig;
use crate::errors::ConfigResult;
use crate::geometry::ChannelGeometry;
use crate::status::{ChannelId, Status, StatusRecord};
use crate::table::StatusTable;
use crate::time::{Timestamp, ValidityInterval};
use crate::update::{DataSource, UpdateOutcome, UpdateProtocol};

/// Set of channel ids in ascending order
pub type ChannelSet = BTreeSet<ChannelId>;

/// Baseline plus per-cycle overlay of channel statuses
///
/// ## Example
///
/// ```rust
/// use changuard_core::{ChannelStatusStore, PlaneGeometry, ProviderConfig, Status};
///
/// let geometry = PlaneGeometry::new(&[8, 8, 16]);
/// let mut store = ChannelStatusStore::new(&ProviderConfig::default(), &geometry, None)?;
///
/// store.update(1);
/// store.record_noisy(3);
/// assert_eq!(store.lookup(3), Status::Noisy);
/// assert_eq!(store.lookup(4), Status::Good);
///
/// // next cycle starts clean
/// store.update(2);
/// assert_eq!(store.lookup(3), Status::Good);
/// # Ok::<(), changuard_core::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct ChannelStatusStore<B = Box<dyn BackingStore>> {
    persistent: StatusTable,
    overlay: StatusTable,
    protocol: UpdateProtocol<B>,
}

impl ChannelStatusStore {
    /// Store over a type-erased backing store (`None` for the default source)
    pub fn new<G>(
        config: &ProviderConfig,
        geometry: &G,
        backing: Option<Box<dyn BackingStore>>,
    ) -> ConfigResult<Self>
    where
        G: ChannelGeometry + ?Sized,
    {
        Self::with_backing_store(config, geometry, backing)
    }
}

impl<B: BackingStore> ChannelStatusStore<B> {
    /// Store over a concrete backing store
    ///
    /// With the default source every geometry channel is seeded with
    /// `config.default_status`; otherwise the baseline stays empty until the
    /// first [`update`](Self::update).
    pub fn with_backing_store<G>(
        config: &ProviderConfig,
        geometry: &G,
        backing: Option<B>,
    ) -> ConfigResult<Self>
    where
        G: ChannelGeometry + ?Sized,
    {
        let source = DataSource::from_config(config);
        let protocol = UpdateProtocol::new(source, backing)?;

        let persistent = if source.is_backed() {
            StatusTable::new()
        } else {
            let mut table = StatusTable::uniform(geometry.channels(), config.default_status);
            table.set_interval(ValidityInterval::unbounded());
            table
        };

        Ok(Self {
            persistent,
            overlay: StatusTable::new(),
            protocol,
        })
    }

    /// Start a new cycle at `timestamp`
    ///
    /// Clears the overlay unconditionally, then refreshes the baseline if the
    /// timestamp falls outside its validity interval. A failed refresh leaves
    /// the previous baseline in place.
    pub fn update(&mut self, timestamp: Timestamp) -> UpdateOutcome {
        self.overlay.clear();
        self.protocol.run(timestamp, &mut self.persistent)
    }

    /// Current status of `channel`: overlay, then baseline, then `Unknown`
    pub fn lookup(&self, channel: ChannelId) -> Status {
        self.overlay
            .status(channel)
            .or_else(|| self.persistent.status(channel))
            .unwrap_or(Status::Unknown)
    }

    /// Baseline status only, ignoring this cycle's verdicts
    pub fn baseline_status(&self, channel: ChannelId) -> Status {
        self.persistent.status(channel).unwrap_or(Status::Unknown)
    }

    /// Channel has a readout connection according to the baseline
    pub fn is_present(&self, channel: ChannelId) -> bool {
        self.baseline_status(channel).is_present()
    }

    /// Channel is dead or low-noise according to the baseline
    pub fn is_bad(&self, channel: ChannelId) -> bool {
        self.baseline_status(channel).is_bad()
    }

    /// Mark `channel` noisy for the rest of this cycle
    ///
    /// Absent or bad channels are left alone; returns whether the overlay
    /// was written.
    pub fn record_noisy(&mut self, channel: ChannelId) -> bool {
        if !self.is_present(channel) || self.is_bad(channel) {
            log_debug!(
                "Rejected noisy verdict for channel {} (baseline {})",
                channel,
                self.baseline_status(channel)
            );
            return false;
        }

        self.overlay.add_or_replace(StatusRecord::noisy(channel));
        true
    }

    /// Baseline channels carrying `status`
    pub fn channels_with_status(&self, status: Status) -> ChannelSet {
        self.persistent.channels_with_status(status)
    }

    /// Baseline channels marked good
    pub fn good_channels(&self) -> ChannelSet {
        self.channels_with_status(Status::Good)
    }

    /// Baseline channels that are dead or low-noise
    pub fn bad_channels(&self) -> ChannelSet {
        let mut bad = self.channels_with_status(Status::Dead);
        bad.extend(self.channels_with_status(Status::LowNoise));
        bad
    }

    /// Baseline channels marked noisy
    pub fn noisy_channels(&self) -> ChannelSet {
        self.channels_with_status(Status::Noisy)
    }

    /// Baseline noisy channels plus this cycle's verdicts
    pub fn current_noisy_channels(&self) -> ChannelSet {
        let mut noisy = self.noisy_channels();
        noisy.extend(self.overlay.iter().map(|record| record.channel));
        noisy
    }

    /// The baseline table
    pub fn persistent(&self) -> &StatusTable {
        &self.persistent
    }

    /// This cycle's verdicts
    pub fn overlay(&self) -> &StatusTable {
        &self.overlay
    }

    /// Number of channels flagged this cycle
    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }

    /// Validity interval of the baseline
    pub fn interval(&self) -> ValidityInterval {
        self.persistent.interval()
    }

    /// Selected data source
    pub fn source(&self) -> DataSource {
        self.protocol.source()
    }

    /// The backing store, if the source uses one
    pub fn backing_store(&self) -> Option<&B> {
        self.protocol.backing_store()
    }

    /// Mutable access to the backing store
    pub fn backing_store_mut(&mut self) -> Option<&mut B> {
        self.protocol.backing_store_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::{MemoryBackingStore, Snapshot};
    use crate::errors::FetchError;
    use crate::geometry::PlaneGeometry;
    use alloc::string::ToString;

    fn backed_store() -> ChannelStatusStore<MemoryBackingStore> {
        let db = MemoryBackingStore::with_snapshots([
            Snapshot::new(ValidityInterval::new(0, 100)).statuses([
                (0, Status::Good),
                (1, Status::Dead),
                (2, Status::LowNoise),
                (3, Status::Disconnected),
                (4, Status::Noisy),
                (5, Status::Good),
            ]),
            Snapshot::new(ValidityInterval::new(100, 200)).statuses([
                (0, Status::Dead),
                (5, Status::Good),
            ]),
        ]);
        ChannelStatusStore::with_backing_store(
            &ProviderConfig::database(),
            &PlaneGeometry::new(&[6]),
            Some(db),
        )
        .unwrap()
    }

    #[test]
    fn default_source_seeds_every_channel() {
        let geometry = PlaneGeometry::new(&[4, 4, 8]);
        let mut store = ChannelStatusStore::new(&ProviderConfig::default(), &geometry, None).unwrap();

        assert_eq!(store.source(), DataSource::Default);
        assert_eq!(store.good_channels().len(), 16);

        assert_eq!(store.update(1_000_000), UpdateOutcome::StaticDefaults);
        assert_eq!(store.good_channels().len(), 16);
        assert_eq!(store.lookup(15), Status::Good);
        assert_eq!(store.lookup(16), Status::Unknown);
    }

    #[test]
    fn default_status_is_configurable() {
        let geometry = PlaneGeometry::new(&[3]);
        let config = ProviderConfig::default().with_default_status(Status::Unknown);
        let store = ChannelStatusStore::new(&config, &geometry, None).unwrap();
        assert_eq!(store.channels_with_status(Status::Unknown).len(), 3);
    }

    #[test]
    fn backed_store_starts_empty() {
        let store = backed_store();
        assert!(store.persistent().is_empty());
        assert_eq!(store.lookup(0), Status::Unknown);
    }

    #[test]
    fn overlay_wins_until_next_update() {
        let mut store = backed_store();
        store.update(10);

        assert!(store.record_noisy(0));
        assert_eq!(store.lookup(0), Status::Noisy);
        assert_eq!(store.baseline_status(0), Status::Good);

        store.update(11);
        assert_eq!(store.lookup(0), Status::Good);
        assert_eq!(store.overlay_len(), 0);
    }

    #[test]
    fn bad_or_absent_channels_never_enter_overlay() {
        let mut store = backed_store();
        store.update(10);

        assert!(!store.record_noisy(1)); // dead
        assert!(!store.record_noisy(2)); // low noise
        assert!(!store.record_noisy(3)); // disconnected
        assert_eq!(store.overlay_len(), 0);
        assert_eq!(store.lookup(1), Status::Dead);
    }

    #[test]
    fn unknown_channel_is_present_and_not_bad() {
        let mut store = backed_store();
        store.update(10);
        assert!(store.is_present(42));
        assert!(!store.is_bad(42));
    }

    #[test]
    fn convenience_sets() {
        let mut store = backed_store();
        store.update(10);
        store.record_noisy(5);

        assert_eq!(store.bad_channels().into_iter().collect::<alloc::vec::Vec<_>>(), [1, 2]);
        assert_eq!(store.noisy_channels().len(), 1);
        assert_eq!(
            store.current_noisy_channels().into_iter().collect::<alloc::vec::Vec<_>>(),
            [4, 5]
        );
        assert!(store.good_channels().contains(&0));
    }

    #[test]
    fn repeated_covered_update_fetches_once() {
        let mut store = backed_store();
        assert!(store.update(10).refreshed());
        assert!(!store.update(10).refreshed());
        assert_eq!(store.backing_store().unwrap().fetch_count(), 1);
        assert_eq!(store.interval(), ValidityInterval::new(0, 100));
    }

    #[test]
    fn failed_refresh_preserves_baseline() {
        let mut store = backed_store();
        store.update(10);

        store
            .backing_store_mut()
            .unwrap()
            .fail_next_fetch(FetchError::Unreachable { reason: "db down".to_string() });

        let outcome = store.update(150);
        assert!(outcome.is_failure());
        assert_eq!(store.lookup(0), Status::Good);
        assert_eq!(store.lookup(1), Status::Dead);
        assert_eq!(store.interval(), ValidityInterval::new(0, 100));

        // recovers next cycle
        assert!(store.update(151).refreshed());
        assert_eq!(store.lookup(0), Status::Dead);
        assert_eq!(store.lookup(1), Status::Unknown);
    }

    #[test]
    fn overlay_cleared_even_when_refresh_fails() {
        let mut store = backed_store();
        store.update(10);
        store.record_noisy(0);

        store
            .backing_store_mut()
            .unwrap()
            .fail_next_fetch(FetchError::Unreachable { reason: "db down".to_string() });
        store.update(150);
        assert_eq!(store.overlay_len(), 0);
    }
}
