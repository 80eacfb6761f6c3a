//! Readiness polling configuration

use crate::error::ConfigResult;
use crate::validation::{validate_path, validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait for the service to come up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Maximum number of health checks before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between failed attempts
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_interval"
    )]
    pub interval: Duration,

    /// Timeout of each individual health check
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_attempt_timeout"
    )]
    pub attempt_timeout: Duration,

    /// Health endpoint path
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval: default_interval(),
            attempt_timeout: default_attempt_timeout(),
            health_path: default_health_path(),
        }
    }
}

impl Validatable for ReadinessConfig {
    fn validate(&self) -> ConfigResult<()> {
        // max_attempts = 0 is allowed and means "fail without probing"
        validate_positive(
            self.attempt_timeout.as_millis(),
            "attempt_timeout",
            self.domain_name(),
        )?;
        validate_path(&self.health_path, "health_path", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "readiness"
    }
}

fn default_max_attempts() -> u32 {
    30
}

fn default_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_attempt_timeout() -> Duration {
    Duration::from_secs(5)
}

pub(crate) fn default_health_path() -> String {
    "/health".to_string()
}
