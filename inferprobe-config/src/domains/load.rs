//! Benchmark load configuration

use crate::error::ConfigResult;
use crate::validation::{validate_path, validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Single-request benchmark and fixed-concurrency load test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Maximum requests in flight during the load test
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Total requests issued by the load test
    #[serde(default = "default_total_requests")]
    pub total_requests: usize,

    /// Unmeasured requests issued before the single-request benchmark
    #[serde(default = "default_warmup_runs")]
    pub warmup_runs: usize,

    /// Measured sequential requests of the single-request benchmark
    #[serde(default = "default_benchmark_runs")]
    pub benchmark_runs: usize,

    /// Prediction endpoint path
    #[serde(default = "default_predict_path")]
    pub predict_path: String,

    /// Field of the prediction response holding the service's own timing
    #[serde(default = "default_reported_latency_field")]
    pub reported_latency_field: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrent_requests(),
            total_requests: default_total_requests(),
            warmup_runs: default_warmup_runs(),
            benchmark_runs: default_benchmark_runs(),
            predict_path: default_predict_path(),
            reported_latency_field: default_reported_latency_field(),
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.concurrent_requests,
            "concurrent_requests",
            self.domain_name(),
        )?;
        validate_positive(self.total_requests, "total_requests", self.domain_name())?;
        validate_positive(self.benchmark_runs, "benchmark_runs", self.domain_name())?;
        validate_path(&self.predict_path, "predict_path", self.domain_name())?;
        validate_required_string(
            &self.reported_latency_field,
            "reported_latency_field",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

fn default_concurrent_requests() -> usize {
    10
}

fn default_total_requests() -> usize {
    100
}

fn default_warmup_runs() -> usize {
    5
}

fn default_benchmark_runs() -> usize {
    50
}

fn default_predict_path() -> String {
    "/predict".to_string()
}

fn default_reported_latency_field() -> String {
    "inference_time_ms".to_string()
}
