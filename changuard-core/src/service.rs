//! Per-cycle channel filter
//!
//! Ties the pieces together the way a host job drives them. Once per cycle,
//! before any consumer asks about channel status:
//!
//! 1. [`ChannelStatusStore::update`] clears last cycle's verdicts and
//!    refreshes the baseline if needed
//! 2. if the noisy channel search is enabled and the cycle carries the raw
//!    digit collection, [`NoisyChannelClassifier::classify`] fills the overlay
//!
//! Consumers then query the service (or its store) for the rest of the cycle.
//!
//! ```rust
//! use changuard_core::digits::{MemoryDigitSource, RawDigit};
//! use changuard_core::{ChannelFilterService, FilterConfig, PlaneGeometry, Status};
//!
//! let config = FilterConfig::default().with_find_noisy_channels(true);
//! let mut service = ChannelFilterService::new(config, PlaneGeometry::new(&[4, 4, 4]), None)?;
//!
//! let swinging: Vec<i16> = (0..100).map(|i| if i % 2 == 0 { 380 } else { 420 }).collect();
//! let cycle = MemoryDigitSource::with_collection("daq", vec![RawDigit::new(2, swinging)]);
//!
//! let report = service.pre_process_cycle(1, &cycle);
//! assert_eq!(report.noisy, 1);
//! assert_eq!(service.lookup(2), Status::Noisy);
//! # Ok::<(), changuard_core::ConfigError>(())
//! ```

use alloc::boxed::Box;

use crate::backing::BackingStore;
use crate::classifier::{ClassifierStats, NoisyChannelClassifier};
use crate::config::FilterConfig;
use crate::digits::DigitSource;
use crate::errors::ConfigResult;
use crate::geometry::{ChannelGeometry, PlaneGeometry};
use crate::status::{ChannelId, Status};
use crate::store::ChannelStatusStore;
use crate::time::Timestamp;
use crate::update::UpdateOutcome;

/// What happened during one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Baseline update result
    pub outcome: UpdateOutcome,
    /// Baseline was replaced this cycle
    pub refreshed: bool,
    /// Channels whose statistics were compared against a cut
    pub classified: usize,
    /// Digits passed over (ineligible, empty or without a cut)
    pub skipped: usize,
    /// Channels flagged noisy this cycle
    pub noisy: usize,
    /// Window length the classifier ended on
    pub clipped_length: Option<usize>,
}

impl CycleReport {
    fn new(outcome: UpdateOutcome) -> Self {
        Self {
            refreshed: outcome.refreshed(),
            outcome,
            classified: 0,
            skipped: 0,
            noisy: 0,
            clipped_length: None,
        }
    }

    fn with_classifier(mut self, stats: ClassifierStats) -> Self {
        self.classified = stats.assessed;
        self.skipped = stats.ineligible + stats.empty + stats.uncategorized;
        self.noisy = stats.flagged;
        self.clipped_length = stats.window;
        self
    }
}

/// Channel status store plus the per-cycle noisy channel search
#[derive(Debug)]
pub struct ChannelFilterService<B = Box<dyn BackingStore>, G = PlaneGeometry> {
    config: FilterConfig,
    geometry: G,
    store: ChannelStatusStore<B>,
    classifier: NoisyChannelClassifier,
}

impl<G: ChannelGeometry> ChannelFilterService<Box<dyn BackingStore>, G> {
    /// Service over a type-erased backing store (`None` for the default source)
    pub fn new(
        config: FilterConfig,
        geometry: G,
        backing: Option<Box<dyn BackingStore>>,
    ) -> ConfigResult<Self> {
        Self::with_backing_store(config, geometry, backing)
    }
}

impl<B: BackingStore, G: ChannelGeometry> ChannelFilterService<B, G> {
    /// Service over a concrete backing store
    pub fn with_backing_store(
        config: FilterConfig,
        geometry: G,
        backing: Option<B>,
    ) -> ConfigResult<Self> {
        let classifier = NoisyChannelClassifier::from_config(&config)?;
        let store = ChannelStatusStore::with_backing_store(&config.provider, &geometry, backing)?;

        Ok(Self {
            config,
            geometry,
            store,
            classifier,
        })
    }

    /// Prepare channel status for the cycle at `timestamp`
    pub fn pre_process_cycle<S>(&mut self, timestamp: Timestamp, source: &S) -> CycleReport
    where
        S: DigitSource + ?Sized,
    {
        let report = CycleReport::new(self.store.update(timestamp));

        if !self.config.find_noisy_channels {
            return report;
        }

        let label = self.config.raw_sample_source_label.as_str();
        let digits = match source.digits(label) {
            Some(digits) => digits,
            None => {
                log_debug!(
                    "No raw digits labelled '{}' at {}, skipping noisy channel search",
                    label,
                    timestamp
                );
                return report;
            }
        };

        let stats = self.classifier.classify(digits, &mut self.store, &self.geometry);
        report.with_classifier(stats)
    }

    /// Current status of `channel`
    pub fn lookup(&self, channel: ChannelId) -> Status {
        self.store.lookup(channel)
    }

    /// The underlying store
    pub fn store(&self) -> &ChannelStatusStore<B> {
        &self.store
    }

    /// Mutable access to the underlying store
    pub fn store_mut(&mut self) -> &mut ChannelStatusStore<B> {
        &mut self.store
    }

    /// Active configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Channel layout
    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// The noisy channel classifier
    pub fn classifier(&self) -> &NoisyChannelClassifier {
        &self.classifier
    }
}
