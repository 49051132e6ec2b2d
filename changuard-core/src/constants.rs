//! Constants for ChanGuard Core
//!
//! Defaults for the noisy-channel classifier and the integer status codes
//! used by calibration databases. Keep magic numbers here.

// ===== CLASSIFIER DEFAULTS =====

/// Fraction of a channel's samples excluded from the truncated mean window.
///
/// 0.1 keeps the 90% of samples closest to the modal ADC value, which drops
/// signal pulses and pickup spikes from the pedestal estimate.
pub const DEFAULT_TRUNCATION_FRACTION: f64 = 0.1;

/// Per-category RMS cut (ADC counts) above which a channel is noisy.
///
/// Index is the channel category (view). Two induction views share 5.0,
/// the collection view is quieter and uses 3.0.
pub const DEFAULT_RMS_THRESHOLDS: [f64; 3] = [5.0, 5.0, 3.0];

/// Label of the raw digit collection analysed each cycle.
pub const DEFAULT_RAW_SAMPLE_LABEL: &str = "daq";

/// Capacity of the per-category threshold vector.
pub const MAX_CATEGORIES: usize = 8;

// ===== BACKING STORE ROW FORMAT =====

/// Named field carrying the integer status code in a fetched row.
pub const STATUS_FIELD: &str = "status";

// ===== EXTERNAL STATUS CODES =====
//
// Integer codes written by the calibration database. Anything outside this
// set is read back as `Status::Unknown`.

/// Channel not connected to readout.
pub const CODE_DISCONNECTED: i64 = 0;
/// Channel connected but produces no signal.
pub const CODE_DEAD: i64 = 1;
/// Channel with abnormally low noise (usually a broken preamp).
pub const CODE_LOWNOISE: i64 = 2;
/// Channel known to be noisy.
pub const CODE_NOISY: i64 = 3;
/// Channel usable.
pub const CODE_GOOD: i64 = 4;
/// Status not determined.
pub const CODE_UNKNOWN: i64 = 5;
