//! Detector configuration.
//!
//! These parameters control preprocessing, background subtraction and the
//! hysteresis state machine. Defaults match the values the detector was
//! originally tuned with on river-weir footage.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::duration;
use crate::error::{ModelError, ModelResult};

/// Blur applied to grayscale frames before background subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlurAlgorithm {
    /// Gaussian kernel; good default for sensor noise.
    #[default]
    Gaussian,
    /// Median filter; better at suppressing salt-and-pepper noise
    /// from debris and rain.
    Median,
}

/// Background subtraction strategy, selected once at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackgroundStrategy {
    /// Exponentially-weighted moving average of past frames. Produces a
    /// continuous deviation map that the coverage meter thresholds.
    Ema {
        /// Weight of the current frame in the running average (0.0 to 1.0).
        weight: f64,
    },
    /// Per-pixel adaptive statistics classifying each pixel directly as
    /// foreground or background. Produces a binary mask; the coverage
    /// meter skips its own thresholding step.
    Adaptive {
        /// Squared deviations above `variance_threshold * variance` are
        /// classified foreground.
        variance_threshold: f64,
    },
}

impl Default for BackgroundStrategy {
    fn default() -> Self {
        Self::Ema {
            weight: default_background_weight(),
        }
    }
}

/// Configuration for one detection run.
///
/// Serialized verbatim into the detection record's `settings` field so an
/// output file always carries the parameters that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Fraction of frame area that must be covered by foreground for a
    /// frame to count as interesting (0.0 to 1.0).
    #[serde(default = "default_interesting_fraction")]
    pub interesting_fraction: f64,

    /// Sustained quiet time required before an open detection closes.
    /// A zero timeout emits one interval per interesting frame, which is
    /// the mode used for per-frame ground-truth comparison.
    #[serde(default = "default_timeout", with = "duration::serde_str")]
    pub timeout: TimeDelta,

    /// Blur kernel size in pixels; must be odd, or 0 to disable.
    #[serde(default = "default_blur_kernel_size")]
    pub blur_kernel_size: u32,

    /// Blur algorithm applied when `blur_kernel_size > 0`.
    #[serde(default)]
    pub blur_algorithm: BlurAlgorithm,

    /// Brightness threshold for binarizing the deviation map; 0 disables
    /// binarization and treats any non-zero deviation as foreground.
    #[serde(default = "default_brightness_threshold")]
    pub brightness_threshold: u8,

    /// Dilation passes growing foreground regions to close small gaps;
    /// 0 disables dilation.
    #[serde(default = "default_dilation_iterations")]
    pub dilation_iterations: u32,

    /// Background subtraction strategy.
    #[serde(default)]
    pub background: BackgroundStrategy,
}

fn default_interesting_fraction() -> f64 {
    0.21
}

fn default_timeout() -> TimeDelta {
    TimeDelta::seconds(2)
}

fn default_blur_kernel_size() -> u32 {
    25
}

fn default_brightness_threshold() -> u8 {
    5
}

fn default_dilation_iterations() -> u32 {
    2
}

fn default_background_weight() -> f64 {
    0.6
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            interesting_fraction: default_interesting_fraction(),
            timeout: default_timeout(),
            blur_kernel_size: default_blur_kernel_size(),
            blur_algorithm: BlurAlgorithm::default(),
            brightness_threshold: default_brightness_threshold(),
            dilation_iterations: default_dilation_iterations(),
            background: BackgroundStrategy::default(),
        }
    }
}

impl DetectorConfig {
    /// Validate parameter ranges.
    ///
    /// Called by the detection pipeline before any frame is processed so a
    /// bad configuration fails up front rather than mid-stream.
    pub fn validate(&self) -> ModelResult<()> {
        if !(0.0..=1.0).contains(&self.interesting_fraction) {
            return Err(ModelError::invalid_config(
                "interesting_fraction",
                format!("{} is outside [0, 1]", self.interesting_fraction),
            ));
        }
        if self.timeout < TimeDelta::zero() {
            return Err(ModelError::invalid_config(
                "timeout",
                "must not be negative",
            ));
        }
        if self.blur_kernel_size > 0 && self.blur_kernel_size % 2 == 0 {
            return Err(ModelError::invalid_config(
                "blur_kernel_size",
                format!("{} is even; kernel size must be odd or 0", self.blur_kernel_size),
            ));
        }
        match self.background {
            BackgroundStrategy::Ema { weight } => {
                if !(0.0..=1.0).contains(&weight) {
                    return Err(ModelError::invalid_config(
                        "background.weight",
                        format!("{} is outside [0, 1]", weight),
                    ));
                }
            }
            BackgroundStrategy::Adaptive { variance_threshold } => {
                if !variance_threshold.is_finite() || variance_threshold <= 0.0 {
                    return Err(ModelError::invalid_config(
                        "background.variance_threshold",
                        format!("{} must be finite and positive", variance_threshold),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Builder-style setter for the interesting-coverage fraction.
    pub fn with_interesting_fraction(mut self, fraction: f64) -> Self {
        self.interesting_fraction = fraction;
        self
    }

    /// Builder-style setter for the hysteresis timeout.
    pub fn with_timeout(mut self, timeout: TimeDelta) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style setter for the background strategy.
    pub fn with_background(mut self, background: BackgroundStrategy) -> Self {
        self.background = background;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.interesting_fraction - 0.21).abs() < f64::EPSILON);
        assert_eq!(config.timeout, TimeDelta::seconds(2));
        assert_eq!(config.blur_kernel_size, 25);
    }

    #[test]
    fn test_even_blur_kernel_rejected() {
        let config = DetectorConfig {
            blur_kernel_size: 24,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidConfig { field: "blur_kernel_size", .. })
        ));
    }

    #[test]
    fn test_fraction_out_of_range_rejected() {
        let config = DetectorConfig::default().with_interesting_fraction(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ema_weight_out_of_range_rejected() {
        let config = DetectorConfig::default()
            .with_background(BackgroundStrategy::Ema { weight: -0.1 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_adaptive_threshold_must_be_positive() {
        let config = DetectorConfig::default()
            .with_background(BackgroundStrategy::Adaptive { variance_threshold: 0.0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = DetectorConfig::default()
            .with_timeout(TimeDelta::milliseconds(2500))
            .with_background(BackgroundStrategy::Adaptive { variance_threshold: 16.0 });
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_timeout_serializes_as_duration_string() {
        let config = DetectorConfig::default();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["timeout"], serde_json::json!("0:00:02"));
    }
}
