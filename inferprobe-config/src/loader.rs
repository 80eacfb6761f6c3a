//! Configuration loading and environment variable handling

use crate::domains::InferProbeConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "INFERPROBE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<InferProbeConfig> {
        self.load(Some(path))
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<InferProbeConfig> {
        self.load(None::<&Path>)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<InferProbeConfig> {
        let config = self.load_unvalidated(config_path)?;
        config.validate_all()?;
        Ok(config)
    }

    /// File (or defaults) plus environment overrides, not yet validated.
    /// Callers that layer further overrides must call `validate_all` last.
    pub fn load_unvalidated(
        &self,
        config_path: Option<impl AsRef<Path>>,
    ) -> ConfigResult<InferProbeConfig> {
        let mut config = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&content)?
            }
            None => InferProbeConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut InferProbeConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_readiness_overrides(&mut config.readiness)?;
        self.apply_monitor_overrides(&mut config.monitor)?;
        self.apply_load_overrides(&mut config.load)?;
        self.apply_stress_overrides(&mut config.stress)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("SERVICE_URL") {
            config.base_url = url;
        }

        if let Ok(image) = self.get_env_var("TEST_IMAGE") {
            config.test_image = PathBuf::from(image);
        }

        if let Some(timeout) = self.parse_millis("REQUEST_TIMEOUT_MS")? {
            config.request_timeout = timeout;
        }

        Ok(())
    }

    fn apply_readiness_overrides(
        &self,
        config: &mut crate::domains::readiness::ReadinessConfig,
    ) -> ConfigResult<()> {
        if let Some(attempts) = self.parse_var("READINESS_MAX_ATTEMPTS")? {
            config.max_attempts = attempts;
        }

        if let Some(interval) = self.parse_millis("READINESS_INTERVAL_MS")? {
            config.interval = interval;
        }

        Ok(())
    }

    fn apply_monitor_overrides(
        &self,
        config: &mut crate::domains::monitor::MonitorConfig,
    ) -> ConfigResult<()> {
        if let Some(duration) = self.parse_millis("MONITOR_DURATION_MS")? {
            config.duration = duration;
        }

        if let Some(interval) = self.parse_millis("MONITOR_INTERVAL_MS")? {
            config.interval = interval;
        }

        Ok(())
    }

    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadConfig,
    ) -> ConfigResult<()> {
        if let Some(concurrency) = self.parse_var("CONCURRENT_REQUESTS")? {
            config.concurrent_requests = concurrency;
        }

        if let Some(total) = self.parse_var("TOTAL_REQUESTS")? {
            config.total_requests = total;
        }

        Ok(())
    }

    fn apply_stress_overrides(
        &self,
        config: &mut crate::domains::stress::StressConfig,
    ) -> ConfigResult<()> {
        if let Some(cooldown) = self.parse_millis("STRESS_COOLDOWN_MS")? {
            config.cooldown = cooldown;
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Some(verbose) = self.parse_var("VERBOSE")? {
            config.verbose = verbose;
        }

        Ok(())
    }

    /// Parse an optional variable, failing on malformed values
    fn parse_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    fn parse_millis(&self, name: &str) -> ConfigResult<Option<Duration>> {
        Ok(self.parse_var::<u64>(name)?.map(Duration::from_millis))
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
