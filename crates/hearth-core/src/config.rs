//! Analytics configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/hearth/config/analytics.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default value.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analytics.toml");

/// Tunable constants for the analytics engine
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Anomaly threshold in standard deviations from the category mean
    pub anomaly_z_threshold: f64,
    /// Minimum samples in a category before any of its expenses can be flagged
    pub anomaly_min_samples: usize,
    /// Default lookback for category baselines and anomaly detection
    pub anomaly_lookback_days: u32,
    /// Months of history at which the data quality score saturates at 100
    pub quality_saturation_months: u32,
    /// Relative amount tolerance when grouping recurring charges
    pub recurring_amount_tolerance: f64,
    /// Distinct months a charge must appear in to count as recurring
    pub recurring_min_months: usize,
    /// Seasonal lookback used when the caller does not give one (0 = all history)
    pub seasonal_default_lookback_months: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            anomaly_z_threshold: 2.0,
            anomaly_min_samples: 3,
            anomaly_lookback_days: 90,
            quality_saturation_months: 12,
            recurring_amount_tolerance: 0.05,
            recurring_min_months: 2,
            seasonal_default_lookback_months: 12,
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration (explicit path, then data-dir override, then embedded default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        match path {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading analytics config");
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                parse_config(&content)
            }
            _ => parse_config(DEFAULT_CONFIG),
        }
    }

    /// Default lookback for seasonal analysis, None meaning all history
    pub fn seasonal_lookback(&self) -> Option<u32> {
        match self.seasonal_default_lookback_months {
            0 => None,
            months => Some(months),
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("hearth").join("config").join("analytics.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    anomalies: Option<RawAnomalies>,
    sufficiency: Option<RawSufficiency>,
    recurring: Option<RawRecurring>,
    seasonal: Option<RawSeasonal>,
}

#[derive(Debug, Deserialize)]
struct RawAnomalies {
    z_threshold: Option<f64>,
    min_samples: Option<usize>,
    lookback_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSufficiency {
    saturation_months: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawRecurring {
    amount_tolerance: Option<f64>,
    min_distinct_months: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawSeasonal {
    default_lookback_months: Option<u32>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AnalyticsConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AnalyticsConfig::default();

    if let Some(anomalies) = raw.anomalies {
        if let Some(z) = anomalies.z_threshold {
            if !z.is_finite() || z <= 0.0 {
                return Err(Error::Config(format!(
                    "anomalies.z_threshold must be positive, got {}",
                    z
                )));
            }
            config.anomaly_z_threshold = z;
        }
        if let Some(min) = anomalies.min_samples {
            // A baseline needs two points before it has any spread
            config.anomaly_min_samples = min.max(2);
        }
        if let Some(days) = anomalies.lookback_days {
            config.anomaly_lookback_days = days;
        }
    }

    if let Some(sufficiency) = raw.sufficiency {
        if let Some(months) = sufficiency.saturation_months {
            if months == 0 {
                return Err(Error::Config(
                    "sufficiency.saturation_months must be at least 1".to_string(),
                ));
            }
            config.quality_saturation_months = months;
        }
    }

    if let Some(recurring) = raw.recurring {
        if let Some(tolerance) = recurring.amount_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(Error::Config(format!(
                    "recurring.amount_tolerance must be non-negative, got {}",
                    tolerance
                )));
            }
            config.recurring_amount_tolerance = tolerance;
        }
        if let Some(months) = recurring.min_distinct_months {
            config.recurring_min_months = months.max(2);
        }
    }

    if let Some(seasonal) = raw.seasonal {
        if let Some(months) = seasonal.default_lookback_months {
            config.seasonal_default_lookback_months = months;
        }
    }

    Ok(config)
}
