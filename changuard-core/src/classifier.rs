//! Noisy-channel classifier
//!
//! Runs once per cycle over the raw digits. For every channel the baseline
//! still considers usable it estimates the truncated RMS of the waveform (see
//! [`stats`](crate::stats)) and flags the channel noisy in the store's overlay
//! when that RMS reaches the threshold of the channel's category.
//!
//! ```text
//! digit ─► eligible? ─no──► skip
//!            │yes
//!            ▼
//!       clip window ─► robust RMS ─► rms ≥ cut[category]? ─yes─► record_noisy
//! ```

use crate::backing::BackingStore;
use crate::config::{FilterConfig, RmsThresholds};
use crate::constants::MAX_CATEGORIES;
use crate::digits::{RawDigit, Sample};
use crate::errors::{ConfigError, ConfigResult};
use crate::geometry::{Category, ChannelGeometry};
use crate::stats::{robust_stats, RobustStats};
use crate::store::ChannelStatusStore;

/// Robust statistics of one channel compared with its cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelAssessment {
    /// Truncated mean and RMS
    pub stats: RobustStats,
    /// RMS cut of the channel's category
    pub threshold: f64,
    /// `stats.rms >= threshold`
    pub noisy: bool,
}

/// Counters for one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierStats {
    /// Digits offered
    pub digits: usize,
    /// Digits whose statistics were computed and compared
    pub assessed: usize,
    /// Skipped: baseline marks the channel bad or absent
    pub ineligible: usize,
    /// Skipped: no samples left after clipping
    pub empty: usize,
    /// Skipped: no category or no threshold for the category
    pub uncategorized: usize,
    /// Channels written to the overlay
    pub flagged: usize,
    /// Final clipped window length, if any channel was eligible
    pub window: Option<usize>,
}

/// Per-cycle noisy channel search
#[derive(Debug, Clone, PartialEq)]
pub struct NoisyChannelClassifier {
    truncation_fraction: f64,
    rms_thresholds: RmsThresholds,
    max_time_samples: Option<usize>,
}

impl NoisyChannelClassifier {
    /// Classifier with explicit parameters
    pub fn new(truncation_fraction: f64, rms_thresholds: &[f64]) -> ConfigResult<Self> {
        let rms_thresholds = RmsThresholds::from_slice(rms_thresholds).map_err(|_| {
            ConfigError::TooManyCategories {
                count: rms_thresholds.len(),
                max: MAX_CATEGORIES,
            }
        })?;

        Self::from_parts(truncation_fraction, rms_thresholds, None)
    }

    /// Classifier from the filter configuration
    pub fn from_config(config: &FilterConfig) -> ConfigResult<Self> {
        Self::from_parts(
            config.truncation_fraction,
            config.rms_thresholds.clone(),
            config.max_time_samples,
        )
    }

    fn from_parts(
        truncation_fraction: f64,
        rms_thresholds: RmsThresholds,
        max_time_samples: Option<usize>,
    ) -> ConfigResult<Self> {
        let config = FilterConfig {
            truncation_fraction,
            rms_thresholds,
            max_time_samples,
            ..FilterConfig::default()
        };
        config.validate()?;

        Ok(Self {
            truncation_fraction: config.truncation_fraction,
            rms_thresholds: config.rms_thresholds,
            max_time_samples: config.max_time_samples,
        })
    }

    /// Bound the analysed window to the readout length
    pub fn with_max_time_samples(mut self, samples: usize) -> Self {
        self.max_time_samples = Some(samples);
        self
    }

    /// Configured truncation fraction
    pub fn truncation_fraction(&self) -> f64 {
        self.truncation_fraction
    }

    /// RMS cut for `category`
    pub fn threshold(&self, category: Category) -> Option<f64> {
        self.rms_thresholds.get(category).copied()
    }

    /// Statistics and verdict for one waveform, without touching any store
    ///
    /// `None` when there are no samples or the category has no cut.
    pub fn assess(&self, samples: &[Sample], category: Category) -> Option<ChannelAssessment> {
        let threshold = self.threshold(category)?;
        let stats = robust_stats(samples, self.truncation_fraction)?;
        Some(ChannelAssessment {
            stats,
            threshold,
            noisy: stats.rms >= threshold,
        })
    }

    /// Classify one cycle's digits, writing verdicts into `store`'s overlay
    ///
    /// The analysed length starts at the readout window and shrinks to the
    /// shortest reported length among eligible channels seen so far, so a
    /// short digit early in the list also shortens every later one.
    pub fn classify<B, G>(
        &self,
        digits: &[RawDigit],
        store: &mut ChannelStatusStore<B>,
        geometry: &G,
    ) -> ClassifierStats
    where
        B: BackingStore,
        G: ChannelGeometry + ?Sized,
    {
        let mut stats = ClassifierStats {
            digits: digits.len(),
            ..ClassifierStats::default()
        };
        let mut window = self.max_time_samples.unwrap_or(usize::MAX);

        for digit in digits {
            let channel = digit.channel;
            if store.is_bad(channel) || !store.is_present(channel) {
                stats.ineligible += 1;
                continue;
            }

            window = window.min(digit.reported_len);
            stats.window = Some(window);

            let category = match geometry.category_of(channel) {
                Some(category) if self.threshold(category).is_some() => category,
                _ => {
                    log_debug!("Channel {} has no RMS cut, not classified", channel);
                    stats.uncategorized += 1;
                    continue;
                }
            };

            let assessment = match self.assess(digit.window(window), category) {
                Some(assessment) => assessment,
                None => {
                    stats.empty += 1;
                    continue;
                }
            };
            stats.assessed += 1;

            if assessment.noisy && store.record_noisy(channel) {
                log_debug!(
                    "Channel {} noisy: rms {:.3} >= cut {:.3} (pedestal {:.2})",
                    channel,
                    assessment.stats.rms,
                    assessment.threshold,
                    assessment.stats.mean
                );
                stats.flagged += 1;
            }
        }

        stats
    }
}

impl Default for NoisyChannelClassifier {
    fn default() -> Self {
        let config = FilterConfig::default();
        Self {
            truncation_fraction: config.truncation_fraction,
            rms_thresholds: config.rms_thresholds,
            max_time_samples: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::{MemoryBackingStore, Snapshot};
    use crate::config::ProviderConfig;
    use crate::geometry::PlaneGeometry;
    use crate::status::Status;
    use crate::time::ValidityInterval;
    use alloc::vec;
    use alloc::vec::Vec;

    /// Pedestal 400 with ±1 jitter
    fn quiet(channel: u32, len: usize) -> RawDigit {
        let samples = (0..len).map(|i| 400 + (i % 3) as i16 - 1).collect();
        RawDigit::new(channel, samples)
    }

    /// Pedestal 400 with ±12 swings
    fn loud(channel: u32, len: usize) -> RawDigit {
        let samples = (0..len)
            .map(|i| 400 + ((i * 7) % 25) as i16 - 12)
            .collect();
        RawDigit::new(channel, samples)
    }

    fn default_store(geometry: &PlaneGeometry) -> ChannelStatusStore {
        ChannelStatusStore::new(&ProviderConfig::default(), geometry, None).unwrap()
    }

    #[test]
    fn loud_channel_is_flagged_quiet_is_not() {
        let geometry = PlaneGeometry::new(&[2, 2, 2]);
        let mut store = default_store(&geometry);
        let classifier = NoisyChannelClassifier::default();

        let digits = vec![quiet(0, 200), loud(1, 200), loud(4, 200)];
        let stats = classifier.classify(&digits, &mut store, &geometry);

        assert_eq!(stats.assessed, 3);
        assert_eq!(stats.flagged, 2);
        assert_eq!(store.lookup(0), Status::Good);
        assert_eq!(store.lookup(1), Status::Noisy);
        assert_eq!(store.lookup(4), Status::Noisy);
    }

    #[test]
    fn threshold_is_inclusive() {
        let classifier = NoisyChannelClassifier::new(0.1, &[0.0]).unwrap();
        let assessment = classifier.assess(&[5, 5, 5, 5], 0).unwrap();
        assert_eq!(assessment.stats.rms, 0.0);
        assert!(assessment.noisy);
    }

    #[test]
    fn category_picks_the_cut() {
        let classifier = NoisyChannelClassifier::new(0.1, &[100.0, 0.5]).unwrap();
        let samples = loud(0, 100).samples;
        assert!(!classifier.assess(&samples, 0).unwrap().noisy);
        assert!(classifier.assess(&samples, 1).unwrap().noisy);
        assert!(classifier.assess(&samples, 2).is_none());
    }

    #[test]
    fn bad_and_absent_channels_are_not_analysed() {
        let geometry = PlaneGeometry::new(&[4]);
        let db = MemoryBackingStore::with_snapshots([Snapshot::new(ValidityInterval::new(0, 10))
            .statuses([
                (0, Status::Dead),
                (1, Status::LowNoise),
                (2, Status::Disconnected),
                (3, Status::Good),
            ])]);
        let mut store =
            ChannelStatusStore::with_backing_store(&ProviderConfig::database(), &geometry, Some(db))
                .unwrap();
        store.update(1);

        let digits: Vec<RawDigit> = (0..4).map(|ch| loud(ch, 100)).collect();
        let stats = NoisyChannelClassifier::default().classify(&digits, &mut store, &geometry);

        assert_eq!(stats.ineligible, 3);
        assert_eq!(stats.flagged, 1);
        assert_eq!(store.overlay_len(), 1);
        assert_eq!(store.lookup(3), Status::Noisy);
    }

    #[test]
    fn window_clips_to_shortest_reported_length() {
        let geometry = PlaneGeometry::new(&[3]);
        let mut store = default_store(&geometry);
        let classifier = NoisyChannelClassifier::default().with_max_time_samples(500);

        let digits = vec![
            quiet(0, 300),
            quiet(1, 300).with_reported_len(120),
            quiet(2, 300),
        ];
        let stats = classifier.classify(&digits, &mut store, &geometry);
        assert_eq!(stats.window, Some(120));
    }

    #[test]
    fn clipping_keeps_the_pedestal_region() {
        let geometry = PlaneGeometry::new(&[1]);
        let mut store = default_store(&geometry);
        let classifier = NoisyChannelClassifier::default().with_max_time_samples(100);

        // quiet for the readout window, wild afterwards
        let mut digit = quiet(0, 100);
        digit.samples.extend(loud(0, 400).samples);
        digit.reported_len = digit.samples.len();

        let stats = classifier.classify(&[digit], &mut store, &geometry);
        assert_eq!(stats.window, Some(100));
        assert_eq!(stats.flagged, 0);
    }

    #[test]
    fn empty_digit_yields_no_verdict() {
        let geometry = PlaneGeometry::new(&[1]);
        let mut store = default_store(&geometry);
        let classifier = NoisyChannelClassifier::new(0.1, &[0.0]).unwrap();

        let stats = classifier.classify(&[RawDigit::new(0, vec![])], &mut store, &geometry);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.flagged, 0);
    }

    #[test]
    fn channel_outside_geometry_is_uncategorized() {
        let geometry = PlaneGeometry::new(&[1]);
        let mut store = default_store(&geometry);

        let stats =
            NoisyChannelClassifier::default().classify(&[loud(9, 50)], &mut store, &geometry);
        assert_eq!(stats.uncategorized, 1);
        assert_eq!(store.overlay_len(), 0);
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(NoisyChannelClassifier::new(1.0, &[5.0]).is_err());
        assert!(NoisyChannelClassifier::new(0.1, &[]).is_err());
        assert!(NoisyChannelClassifier::new(0.1, &[f64::INFINITY]).is_err());
    }
}
