//! Histogram-Based Robust Statistics
//!
//! ## Overview
//!
//! A channel's pedestal (baseline) and noise are estimated from the
//! histogram of its raw ADC samples, not from a plain mean and standard
//! deviation. Signal pulses and pickup spikes populate the tails of the
//! distribution; the bulk of the samples sit in a narrow peak around the
//! pedestal. Working outward from the peak keeps the tails out.
//!
//! ## Algorithm
//!
//! ```text
//! counts
//!   │        ┌──┐
//!   │     ┌──┤  ├──┐
//!   │  ┌──┤  │  │  ├──┐                     ┌──┐
//!   └──┴──┴──┴──┴──┴──┴────────────────────┴──┴──► ADC
//!         ◄──o──┤mode├──o──►                 tail (pulse)
//!         window grows by one offset per step
//! ```
//!
//! 1. **Histogram**: sample value → occurrence count
//! 2. **Mode**: the most populated bin; ties go to the smallest value
//! 3. **Target**: `floor((1 - f) × N) - 1` samples must be inside the window
//! 4. **Window expansion**: starting from the mode bin, add the bins at
//!    `mode - o` and `mode + o` for `o = 1, 2, ...`, checking the target only
//!    after both sides of an offset have been added
//! 5. **Mean**: weighted mean over the window
//! 6. **RMS**: the same expansion again, accumulating squared deviations from
//!    that mean
//!
//! Both passes run the single [`expand_window`] routine with a different
//! [`WindowAccumulator`], so they always visit the same bins.
//!
//! ## Overshoot
//!
//! Because the target is only checked once per offset, the last step may add
//! two bins when one would have been enough. The window can therefore hold
//! more than `target` samples and be lopsided by one bin. Tightening the
//! stopping rule changes which channels are flagged.
//!
//! ## Example
//!
//! ```rust
//! use changuard_core::stats::robust_stats;
//!
//! let samples = [10, 10, 10, 10, 11, 11, 9, 9, 9, 12];
//! let stats = robust_stats(&samples, 0.1).unwrap();
//!
//! assert_eq!(stats.mode, 10);
//! assert_eq!(stats.target, 8);
//! assert_eq!(stats.window_count, 9); // 12 stays outside
//! assert!((stats.mean - 89.0 / 9.0).abs() < 1e-12);
//! ```

use alloc::collections::{btree_map, BTreeMap};

use crate::digits::Sample;

/// Occurrence count of each distinct sample value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    bins: BTreeMap<Sample, u32>,
    total: usize,
}

impl Histogram {
    /// Build from raw samples
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut bins = BTreeMap::new();
        for &sample in samples {
            *bins.entry(sample).or_insert(0u32) += 1;
        }
        Self {
            bins,
            total: samples.len(),
        }
    }

    /// Count at `value`; zero for empty or unrepresentable bins
    pub fn count(&self, value: i32) -> u32 {
        Sample::try_from(value)
            .ok()
            .and_then(|v| self.bins.get(&v))
            .copied()
            .unwrap_or(0)
    }

    /// Most populated bin as `(value, count)`
    ///
    /// Scans in ascending value order and only moves on a strictly greater
    /// count, so ties resolve to the smallest value.
    pub fn mode(&self) -> Option<(Sample, u32)> {
        let mut best: Option<(Sample, u32)> = None;
        for (&value, &count) in &self.bins {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((value, count)),
            }
        }
        best
    }

    /// Number of samples histogrammed
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct values
    pub fn distinct(&self) -> usize {
        self.bins.len()
    }

    /// True when no samples were histogrammed
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Smallest populated value
    pub fn min_value(&self) -> Option<Sample> {
        self.bins.keys().next().copied()
    }

    /// Largest populated value
    pub fn max_value(&self) -> Option<Sample> {
        self.bins.keys().next_back().copied()
    }

    /// Bins in ascending value order
    pub fn iter(&self) -> btree_map::Iter<'_, Sample, u32> {
        self.bins.iter()
    }
}

/// Per-bin contribution collected during window expansion
pub trait WindowAccumulator {
    /// Fold `count` samples of `value` into the running total
    fn include(&mut self, value: i32, count: u32);
}

/// Σ count × value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedSum {
    /// Running sum
    pub sum: f64,
}

impl WindowAccumulator for WeightedSum {
    fn include(&mut self, value: i32, count: u32) {
        self.sum += f64::from(count) * f64::from(value);
    }
}

/// Σ count × (value − mean)²
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquaredDeviation {
    /// Centre the deviations are taken from
    pub mean: f64,
    /// Running sum
    pub sum: f64,
}

impl SquaredDeviation {
    /// Accumulator centred on `mean`
    pub fn around(mean: f64) -> Self {
        Self { mean, sum: 0.0 }
    }
}

impl WindowAccumulator for SquaredDeviation {
    fn include(&mut self, value: i32, count: u32) {
        let deviation = f64::from(value) - self.mean;
        self.sum += f64::from(count) * deviation * deviation;
    }
}

/// Extent reached by one expansion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowExtent {
    /// Samples inside the window
    pub count: u64,
    /// Largest offset from the mode that was visited (0 if none)
    pub max_offset: u32,
}

/// Minimum number of samples the truncated window must hold
///
/// May be zero or negative for tiny inputs, in which case the mode bin alone
/// satisfies it.
pub fn target_count(samples: usize, truncation_fraction: f64) -> i64 {
    libm::floor((1.0 - truncation_fraction) * samples as f64) as i64 - 1
}

/// Grow a symmetric window around `mode` until it holds at least `target`
/// samples, feeding every included bin to `acc`
///
/// The target is compared once per offset, after both neighbours were added.
/// Expansion also stops once both sides are past the populated range, so an
/// unreachable target cannot loop forever.
pub fn expand_window<A: WindowAccumulator>(
    histogram: &Histogram,
    mode: Sample,
    target: i64,
    acc: &mut A,
) -> WindowExtent {
    let centre = i32::from(mode);
    let mode_count = histogram.count(centre);
    acc.include(centre, mode_count);

    let (lowest, highest) = match (histogram.min_value(), histogram.max_value()) {
        (Some(lo), Some(hi)) => (i32::from(lo), i32::from(hi)),
        _ => return WindowExtent { count: u64::from(mode_count), max_offset: 0 },
    };

    let mut count = u64::from(mode_count);
    let mut offset: i32 = 1;
    let mut max_offset = 0;

    while (count as i64) < target {
        let below = centre - offset;
        let above = centre + offset;
        if below < lowest && above > highest {
            break;
        }

        for value in [below, above] {
            let bin = histogram.count(value);
            if bin > 0 {
                count += u64::from(bin);
                acc.include(value, bin);
            }
        }

        max_offset = offset as u32;
        offset += 1;
    }

    WindowExtent { count, max_offset }
}

/// Robust pedestal and noise of one waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustStats {
    /// Modal sample value
    pub mode: Sample,
    /// Samples in the modal bin
    pub mode_count: u32,
    /// Required window population
    pub target: i64,
    /// Actual window population (may overshoot `target`)
    pub window_count: u64,
    /// Largest offset from the mode inside the window
    pub max_offset: u32,
    /// Truncated mean
    pub mean: f64,
    /// Truncated RMS about `mean`
    pub rms: f64,
}

/// Truncated mean and RMS of `samples`; `None` when there are no samples
pub fn robust_stats(samples: &[Sample], truncation_fraction: f64) -> Option<RobustStats> {
    let histogram = Histogram::from_samples(samples);
    robust_stats_from_histogram(&histogram, truncation_fraction)
}

/// As [`robust_stats`], from a prebuilt histogram
pub fn robust_stats_from_histogram(
    histogram: &Histogram,
    truncation_fraction: f64,
) -> Option<RobustStats> {
    let (mode, mode_count) = histogram.mode()?;
    let target = target_count(histogram.total(), truncation_fraction);

    let mut weighted = WeightedSum::default();
    let extent = expand_window(histogram, mode, target, &mut weighted);
    let mean = weighted.sum / extent.count as f64;

    let mut spread = SquaredDeviation::around(mean);
    let rms_extent = expand_window(histogram, mode, target, &mut spread);
    debug_assert_eq!(extent, rms_extent);

    let rms = libm::sqrt(f64::max(0.0, spread.sum / rms_extent.count as f64));

    Some(RobustStats {
        mode,
        mode_count,
        target,
        window_count: extent.count,
        max_offset: extent.max_offset,
        mean,
        rms,
    })
}
