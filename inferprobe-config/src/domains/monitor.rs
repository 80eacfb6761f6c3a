//! Health monitoring configuration

use crate::error::ConfigResult;
use crate::validation::{validate_path, validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Continuous health sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Total monitoring duration
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_duration"
    )]
    pub duration: Duration,

    /// Delay between samples
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_interval"
    )]
    pub interval: Duration,

    /// Timeout of each health check
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_sample_timeout"
    )]
    pub sample_timeout: Duration,

    /// Health endpoint path
    #[serde(default = "crate::domains::readiness::default_health_path")]
    pub health_path: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            interval: default_interval(),
            sample_timeout: default_sample_timeout(),
            health_path: crate::domains::readiness::default_health_path(),
        }
    }
}

impl Validatable for MonitorConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.duration.as_millis(), "duration", self.domain_name())?;
        validate_positive(self.interval.as_millis(), "interval", self.domain_name())?;
        validate_positive(
            self.sample_timeout.as_millis(),
            "sample_timeout",
            self.domain_name(),
        )?;
        validate_path(&self.health_path, "health_path", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "monitor"
    }
}

fn default_duration() -> Duration {
    Duration::from_secs(30)
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_sample_timeout() -> Duration {
    Duration::from_secs(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = MonitorConfig {
            duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
