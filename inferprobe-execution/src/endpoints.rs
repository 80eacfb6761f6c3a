//! Endpoint contract checks

use crate::prediction::PredictionTarget;
use inferprobe_config::TargetConfig;
use inferprobe_core::RequestOutcome;
use inferprobe_http::api::{self, ApiError};
use inferprobe_http::{
    BatchPredictResponse, DevicesResponse, HealthResponse, HttpRequest, PredictResponse,
    RequestExecutor, RootResponse,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const BATCH_CHECK_IMAGES: usize = 2;

/// Result of checking one endpoint against its expected shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointCheck {
    pub name: String,
    pub path: String,
    pub success: bool,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EndpointCheck {
    fn from_outcome(
        name: &str,
        path: &str,
        outcome: &RequestOutcome,
        validate: impl FnOnce(&RequestOutcome) -> Result<(), ApiError>,
    ) -> Self {
        let verdict = if outcome.is_success() {
            validate(outcome).map_err(|e| e.to_string())
        } else {
            Err(outcome
                .error_reason()
                .unwrap_or("request failed")
                .to_string())
        };

        if let Err(reason) = &verdict {
            warn!("Endpoint check '{}' failed: {}", name, reason);
        } else {
            debug!("Endpoint check '{}' passed", name);
        }

        Self {
            name: name.to_string(),
            path: path.to_string(),
            success: verdict.is_ok(),
            latency_ms: outcome.latency_ms(),
            status: outcome.status_code(),
            reason: verdict.err(),
        }
    }
}

/// Exercises each public endpoint once and validates the response body.
/// Failures are reported, never raised.
pub struct EndpointChecker {
    executor: Arc<dyn RequestExecutor>,
    target: TargetConfig,
    timeout: Duration,
}

impl EndpointChecker {
    pub fn new(executor: Arc<dyn RequestExecutor>, target: TargetConfig) -> Self {
        let timeout = target.request_timeout;
        Self {
            executor,
            target,
            timeout,
        }
    }

    async fn get(&self, path: &str) -> RequestOutcome {
        let request = HttpRequest::get(self.target.endpoint(path)).expect_status(200);
        self.executor.execute(&request, self.timeout).await
    }

    /// Check `/`, `/health`, `/devices` and `/metrics`, plus the prediction
    /// endpoints when a sample image is available
    pub async fn check_all(&self, prediction: Option<&PredictionTarget>) -> Vec<EndpointCheck> {
        let mut checks = Vec::new();

        let outcome = self.get("/").await;
        checks.push(EndpointCheck::from_outcome("root", "/", &outcome, |o| {
            api::decode::<RootResponse>(o).map(|_| ())
        }));

        let outcome = self.get("/health").await;
        checks.push(EndpointCheck::from_outcome("health", "/health", &outcome, |o| {
            HealthResponse::from_outcome(o).map(|_| ())
        }));

        let outcome = self.get("/devices").await;
        checks.push(EndpointCheck::from_outcome("devices", "/devices", &outcome, |o| {
            api::decode::<DevicesResponse>(o).map(|_| ())
        }));

        let outcome = self.get("/metrics").await;
        let marker = self.target.metrics_marker.as_str();
        checks.push(EndpointCheck::from_outcome("metrics", "/metrics", &outcome, |o| {
            api::check_metrics(o, marker)
        }));

        if let Some(prediction) = prediction {
            checks.extend(self.check_prediction(prediction).await);
        }

        checks
    }

    async fn check_prediction(&self, prediction: &PredictionTarget) -> Vec<EndpointCheck> {
        let mut checks = Vec::new();

        let request = prediction.predict_request();
        let path = path_of(&request.url, &self.target.base_url);
        let outcome = self.executor.execute(&request, self.timeout).await;
        checks.push(EndpointCheck::from_outcome("predict", &path, &outcome, |o| {
            PredictResponse::from_outcome(o).map(|_| ())
        }));

        let request = prediction.batch_request(BATCH_CHECK_IMAGES);
        let path = path_of(&request.url, &self.target.base_url);
        let outcome = self.executor.execute(&request, self.timeout).await;
        checks.push(EndpointCheck::from_outcome("predict batch", &path, &outcome, |o| {
            BatchPredictResponse::from_outcome(o, BATCH_CHECK_IMAGES).map(|_| ())
        }));

        let request = prediction.invalid_upload_request();
        let path = path_of(&request.url, &self.target.base_url);
        let outcome = self.executor.execute(&request, self.timeout).await;
        checks.push(EndpointCheck::from_outcome(
            "predict rejects invalid upload",
            &path,
            &outcome,
            |_| Ok(()),
        ));

        checks
    }
}

fn path_of(url: &str, base_url: &str) -> String {
    url.strip_prefix(base_url.trim_end_matches('/'))
        .unwrap_or(url)
        .to_string()
}
