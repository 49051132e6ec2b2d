//! Raw digit input
//!
//! Each cycle the host hands over, per channel, a decompressed sequence of
//! ADC samples together with the length the readout reported for it. The two
//! can differ (truncated or padded waveforms), which is why the classifier
//! clips to the shortest window it has seen.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::status::ChannelId;

/// One ADC sample
pub type Sample = i16;

/// Decompressed waveform of one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDigit {
    /// Channel the waveform was read from
    pub channel: ChannelId,
    /// Decompressed samples
    pub samples: Vec<Sample>,
    /// Length reported by the readout
    pub reported_len: usize,
}

impl RawDigit {
    /// Digit whose reported length matches its samples
    pub fn new(channel: ChannelId, samples: Vec<Sample>) -> Self {
        let reported_len = samples.len();
        Self {
            channel,
            samples,
            reported_len,
        }
    }

    /// Override the reported length
    pub fn with_reported_len(mut self, reported_len: usize) -> Self {
        self.reported_len = reported_len;
        self
    }

    /// First `len` samples, or all of them if fewer are held
    pub fn window(&self, len: usize) -> &[Sample] {
        &self.samples[..len.min(self.samples.len())]
    }
}

/// Per-cycle provider of raw digit collections
pub trait DigitSource {
    /// Digits stored under `label`, or `None` when the cycle has none
    fn digits(&self, label: &str) -> Option<&[RawDigit]>;
}

/// Cycle data held in memory, keyed by collection label
///
/// ```rust
/// use changuard_core::digits::{DigitSource, MemoryDigitSource, RawDigit};
///
/// let mut cycle = MemoryDigitSource::new();
/// cycle.insert("daq", vec![RawDigit::new(0, vec![400, 401, 399])]);
///
/// assert_eq!(cycle.digits("daq").map(|d| d.len()), Some(1));
/// assert!(cycle.digits("other").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDigitSource {
    collections: BTreeMap<String, Vec<RawDigit>>,
}

impl MemoryDigitSource {
    /// No collections
    pub fn new() -> Self {
        Self::default()
    }

    /// Single collection under `label`
    pub fn with_collection(label: &str, digits: Vec<RawDigit>) -> Self {
        let mut source = Self::new();
        source.insert(label, digits);
        source
    }

    /// Store `digits` under `label`, replacing any previous collection
    pub fn insert(&mut self, label: &str, digits: Vec<RawDigit>) {
        self.collections.insert(label.to_string(), digits);
    }

    /// Append one digit to the collection under `label`
    pub fn push(&mut self, label: &str, digit: RawDigit) {
        self.collections
            .entry(label.to_string())
            .or_default()
            .push(digit);
    }
}

impl DigitSource for MemoryDigitSource {
    fn digits(&self, label: &str) -> Option<&[RawDigit]> {
        self.collections.get(label).map(Vec::as_slice)
    }
}
