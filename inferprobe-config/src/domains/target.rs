//! Service-under-test configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the inference service lives and how to talk to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL of the service, without a trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sample image uploaded by the prediction benchmarks
    #[serde(default = "default_test_image")]
    pub test_image: PathBuf,

    /// Per-request timeout for benchmark traffic
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_request_timeout"
    )]
    pub request_timeout: Duration,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Text that must appear in the `/metrics` exposition
    #[serde(default = "default_metrics_marker")]
    pub metrics_marker: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            test_image: default_test_image(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            metrics_marker: default_metrics_marker(),
        }
    }
}

impl TargetConfig {
    /// Join a request path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_positive(
            self.request_timeout.as_millis(),
            "request_timeout",
            self.domain_name(),
        )?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        validate_required_string(&self.metrics_marker, "metrics_marker", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_test_image() -> PathBuf {
    PathBuf::from("./test-image.jpg")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("inferprobe/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_metrics_marker() -> String {
    "ai_service".to_string()
}
