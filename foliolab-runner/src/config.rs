//! Pipeline configuration.
//!
//! Stored as TOML. Every field has a default, so an empty file (or no file
//! at all) gives the standard pipeline: five fetch attempts with 4s to 10s
//! backoff, 20 trading days of minimum history, a 1% weight tolerance and a
//! five-year fallback lookback.

use foliolab_core::data::retry::{retry_transient, RetryPolicy};
use foliolab_core::data::DEFAULT_MIN_ROWS;
use foliolab_core::domain::{BASE_VALUE, WEIGHT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Backoff settings for transient fetch failures, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub multiplier_secs: f64,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier_secs: 1.0,
            min_delay_secs: 4.0,
            max_delay_secs: 10.0,
        }
    }
}

/// Explicit configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub retry: RetryConfig,
    /// Rows the reconciled table must have.
    pub min_history_rows: usize,
    /// Allowed `|sum(weights) - 1|`.
    pub weight_tolerance: f64,
    /// Lookback used when the start date cannot be resolved.
    pub fallback_lookback_years: u32,
    pub trading_days_per_year: u32,
    /// First value of both equity curves.
    pub base_value: f64,
    /// Fetch symbols on the rayon pool instead of one after another.
    pub parallel_fetch: bool,
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            min_history_rows: DEFAULT_MIN_ROWS,
            weight_tolerance: WEIGHT_TOLERANCE,
            fallback_lookback_years: 5,
            trading_days_per_year: 252,
            base_value: BASE_VALUE,
            parallel_fetch: true,
            request_timeout_secs: 30,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.retry;
        if r.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        for (name, secs) in [
            ("retry.multiplier_secs", r.multiplier_secs),
            ("retry.min_delay_secs", r.min_delay_secs),
            ("retry.max_delay_secs", r.max_delay_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number of seconds"
                )));
            }
        }
        if r.min_delay_secs > r.max_delay_secs {
            return Err(ConfigError::Invalid(
                "retry.min_delay_secs exceeds retry.max_delay_secs".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.weight_tolerance) {
            return Err(ConfigError::Invalid("weight_tolerance must be in [0, 1)".into()));
        }
        if self.trading_days_per_year == 0 {
            return Err(ConfigError::Invalid("trading_days_per_year must be positive".into()));
        }
        if !(self.base_value.is_finite() && self.base_value > 0.0) {
            return Err(ConfigError::Invalid("base_value must be positive".into()));
        }
        Ok(())
    }

    /// The fetch retry policy these settings describe.
    pub fn retry_policy(&self) -> RetryPolicy {
        let secs = |s: f64| Duration::try_from_secs_f64(s).unwrap_or(Duration::ZERO);
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            multiplier: secs(self.retry.multiplier_secs),
            min_delay: secs(self.retry.min_delay_secs),
            max_delay: secs(self.retry.max_delay_secs),
            classify: retry_transient,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
