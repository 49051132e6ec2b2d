//! Common fixtures for integration tests
//!
//! This module provides:
//! - A deterministic waveform generator (pedestal plus noise, optional pulse)
//! - A small three-plane detector geometry
//! - Calibration snapshot builders for the in-memory backing store

#![allow(dead_code)]

use changuard_core::{
    ChannelId, ChannelStatusStore, MemoryBackingStore, PlaneGeometry, ProviderConfig, RawDigit,
    Sample, Snapshot, Status, ValidityInterval,
};

/// Channels per plane of the test detector: two induction, one collection
pub const PLANES: [u32; 3] = [8, 8, 16];

/// Nominal pedestal of every generated waveform
pub const PEDESTAL: Sample = 500;

/// Samples per generated waveform
pub const WAVEFORM_LEN: usize = 400;

/// Three-plane test detector with 32 channels
pub fn geometry() -> PlaneGeometry {
    PlaneGeometry::new(&PLANES)
}

/// Pseudo-random waveform generator
///
/// Same seed, same waveforms, so verdicts are reproducible run to run.
pub struct DigitGenerator {
    seed: u32,
}

impl DigitGenerator {
    /// Generator with the default seed
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    /// Generator with an explicit seed
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }

    /// Pedestal with roughly unit noise; truncated RMS well under any cut
    pub fn quiet(&mut self, channel: ChannelId) -> RawDigit {
        self.waveform(channel, 1.5, WAVEFORM_LEN)
    }

    /// Pedestal with ~10 ADC noise; truncated RMS above the default cuts
    pub fn loud(&mut self, channel: ChannelId) -> RawDigit {
        self.waveform(channel, 20.0, WAVEFORM_LEN)
    }

    /// Quiet waveform carrying a short, tall signal pulse
    pub fn quiet_with_pulse(&mut self, channel: ChannelId) -> RawDigit {
        let mut digit = self.quiet(channel);
        for sample in digit.samples.iter_mut().skip(150).take(10) {
            *sample += 300;
        }
        digit
    }

    /// Quiet waveforms for every channel in `channels`, loud for `loud`
    pub fn cycle(&mut self, channels: core::ops::Range<ChannelId>, loud: &[ChannelId]) -> Vec<RawDigit> {
        channels
            .map(|channel| {
                if loud.contains(&channel) {
                    self.loud(channel)
                } else {
                    self.quiet(channel)
                }
            })
            .collect()
    }

    /// Pedestal plus approximately Gaussian noise of the given amplitude
    pub fn waveform(&mut self, channel: ChannelId, amplitude: f32, len: usize) -> RawDigit {
        let samples = (0..len)
            .map(|_| {
                let noise = self.random_noise(amplitude);
                PEDESTAL + noise.round() as Sample
            })
            .collect();
        RawDigit::new(channel, samples)
    }

    /// Irwin-Hall approximation: sum of four uniforms, centred
    fn random_noise(&mut self, amplitude: f32) -> f32 {
        let sum: f32 = (0..4).map(|_| self.random_float()).sum();
        (sum - 2.0) * amplitude
    }

    fn random_float(&mut self) -> f32 {
        self.seed = self.seed.wrapping_mul(1664525).wrapping_add(1013904223);
        (self.seed as f32) / (u32::MAX as f32)
    }
}

/// Snapshot valid for `[begin, end)` holding `statuses`
pub fn calibration(begin: u64, end: u64, statuses: &[(ChannelId, Status)]) -> Snapshot {
    Snapshot::new(ValidityInterval::new(begin, end)).statuses(statuses.iter().copied())
}

/// Snapshot with every test detector channel good except `overrides`
pub fn full_calibration(begin: u64, end: u64, overrides: &[(ChannelId, Status)]) -> Snapshot {
    let channels = geometry_channel_count();
    let statuses = (0..channels).map(|channel| {
        let status = overrides
            .iter()
            .find(|(ch, _)| *ch == channel)
            .map(|(_, status)| *status)
            .unwrap_or(Status::Good);
        (channel, status)
    });
    Snapshot::new(ValidityInterval::new(begin, end)).statuses(statuses)
}

/// Database-backed store over the test detector
pub fn database_store(snapshots: Vec<Snapshot>) -> ChannelStatusStore<MemoryBackingStore> {
    ChannelStatusStore::with_backing_store(
        &ProviderConfig::database(),
        &geometry(),
        Some(MemoryBackingStore::with_snapshots(snapshots)),
    )
    .expect("database store")
}

fn geometry_channel_count() -> ChannelId {
    PLANES.iter().sum()
}
