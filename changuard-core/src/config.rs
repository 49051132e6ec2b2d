//! Provider and filter configuration
//!
//! Two layers, mirroring how a host job configures channel filtering:
//!
//! - [`ProviderConfig`] selects where the status baseline comes from
//! - [`FilterConfig`] adds the per-cycle noisy-channel search on top
//!
//! Every option has a default, so an empty configuration is valid:
//!
//! ```rust
//! use changuard_core::FilterConfig;
//!
//! let config = FilterConfig::default()
//!     .with_find_noisy_channels(true)
//!     .with_truncation_fraction(0.2);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.raw_sample_source_label, "daq");
//! ```

use alloc::string::{String, ToString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_RAW_SAMPLE_LABEL, DEFAULT_RMS_THRESHOLDS, DEFAULT_TRUNCATION_FRACTION,
    MAX_CATEGORIES,
};
use crate::errors::{ConfigError, ConfigResult};
use crate::status::Status;

/// Fixed-capacity per-category RMS thresholds
pub type RmsThresholds = heapless::Vec<f64, MAX_CATEGORIES>;

/// Where the persistent status table comes from
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProviderConfig {
    /// Refresh from the conditions database (highest priority)
    pub use_database: bool,
    /// Refresh from a calibration file
    pub use_file: bool,
    /// Status seeded for every channel when neither source is used
    pub default_status: Status,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            use_database: false,
            use_file: false,
            default_status: Status::Good,
        }
    }
}

impl ProviderConfig {
    /// Baseline from the conditions database
    pub fn database() -> Self {
        Self {
            use_database: true,
            ..Self::default()
        }
    }

    /// Baseline from a calibration file
    pub fn file() -> Self {
        Self {
            use_file: true,
            ..Self::default()
        }
    }

    /// Override the seeded default status
    pub fn with_default_status(mut self, status: Status) -> Self {
        self.default_status = status;
        self
    }
}

/// Full channel filter configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterConfig {
    /// Baseline source selection
    pub provider: ProviderConfig,
    /// Run the per-cycle noisy channel search
    pub find_noisy_channels: bool,
    /// Fraction of samples left outside the truncated window, in `[0, 1)`
    pub truncation_fraction: f64,
    /// RMS cut per category; a channel at or above its cut is noisy
    pub rms_thresholds: RmsThresholds,
    /// Label of the raw digit collection to analyse
    pub raw_sample_source_label: String,
    /// Readout window length; samples past it are ignored
    pub max_time_samples: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            find_noisy_channels: false,
            truncation_fraction: DEFAULT_TRUNCATION_FRACTION,
            rms_thresholds: RmsThresholds::from_slice(&DEFAULT_RMS_THRESHOLDS)
                .unwrap_or_default(),
            raw_sample_source_label: DEFAULT_RAW_SAMPLE_LABEL.to_string(),
            max_time_samples: None,
        }
    }
}

impl FilterConfig {
    /// Parse from JSON; absent keys keep their defaults
    ///
    /// ```rust
    /// use changuard_core::FilterConfig;
    ///
    /// let config = FilterConfig::from_json(r#"{
    ///     "find_noisy_channels": true,
    ///     "rms_thresholds": [4.0, 4.0, 2.5],
    ///     "provider": { "use_database": true }
    /// }"#)?;
    /// assert!(config.provider.use_database);
    /// assert_eq!(config.truncation_fraction, 0.1);
    /// # Ok::<(), changuard_core::ConfigError>(())
    /// ```
    #[cfg(feature = "serde_json")]
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: FilterConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the provider section
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }

    /// Enable or disable the noisy channel search
    pub fn with_find_noisy_channels(mut self, enabled: bool) -> Self {
        self.find_noisy_channels = enabled;
        self
    }

    /// Set the truncation fraction (checked by [`validate`](Self::validate))
    pub fn with_truncation_fraction(mut self, fraction: f64) -> Self {
        self.truncation_fraction = fraction;
        self
    }

    /// Set the per-category RMS thresholds
    pub fn with_rms_thresholds(mut self, thresholds: &[f64]) -> ConfigResult<Self> {
        self.rms_thresholds = RmsThresholds::from_slice(thresholds).map_err(|_| {
            ConfigError::TooManyCategories {
                count: thresholds.len(),
                max: MAX_CATEGORIES,
            }
        })?;
        Ok(self)
    }

    /// Set the raw digit collection label
    pub fn with_raw_sample_source_label(mut self, label: &str) -> Self {
        self.raw_sample_source_label = label.to_string();
        self
    }

    /// Bound the number of samples analysed per channel
    pub fn with_max_time_samples(mut self, samples: usize) -> Self {
        self.max_time_samples = Some(samples);
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        let fraction = self.truncation_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(ConfigError::TruncationFractionOutOfRange { value: fraction });
        }

        if self.rms_thresholds.is_empty() {
            return Err(ConfigError::EmptyThresholds);
        }

        for (category, &value) in self.rms_thresholds.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { category, value });
            }
        }

        Ok(())
    }
}
