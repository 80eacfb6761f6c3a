//! Domain-specific configuration modules

pub mod load;
pub mod logging;
pub mod monitor;
pub mod readiness;
pub mod stress;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main inferprobe configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InferProbeConfig {
    /// Service under test
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Startup readiness polling
    #[serde(default)]
    pub readiness: readiness::ReadinessConfig,

    /// Continuous health monitoring
    #[serde(default)]
    pub monitor: monitor::MonitorConfig,

    /// Single-request and fixed-concurrency benchmarks
    #[serde(default)]
    pub load: load::LoadConfig,

    /// Escalating stress test
    #[serde(default)]
    pub stress: stress::StressConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl InferProbeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.readiness.validate()?;
        self.monitor.validate()?;
        self.load.validate()?;
        self.stress.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = Self::default();
        serde_yaml::to_string(&config).unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(InferProbeConfig::default().validate_all().is_ok());
    }

    #[test]
    fn test_sample_round_trips() {
        let sample = InferProbeConfig::generate_sample();
        let parsed: InferProbeConfig = serde_yaml::from_str(&sample).unwrap();
        assert!(parsed.validate_all().is_ok());
        assert_eq!(parsed.stress.stages.len(), 5);
    }
}
