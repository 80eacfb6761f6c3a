//! HTTP configuration

use inferprobe_config::TargetConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Client-wide request timeout; individual calls may lower it
    pub timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: u32,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: concat!("inferprobe/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl From<&TargetConfig> for HttpConfig {
    fn from(config: &TargetConfig) -> Self {
        Self {
            timeout: config.request_timeout,
            user_agent: config.user_agent.clone(),
            ..Self::default()
        }
    }
}
