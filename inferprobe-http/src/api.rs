//! Typed response shapes of the inference service
//!
//! Each endpoint's success body is decoded into one of these structures.
//! A body that does not fit is an [`ApiError::Protocol`], which callers
//! record against the request rather than aborting.

use inferprobe_core::RequestOutcome;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors raised while interpreting a response body
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootResponse {
    pub service: String,
    pub version: String,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub cuda_available: bool,
    pub rocm_available: bool,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// `GET /devices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<JsonValue>,
    pub current: JsonValue,
}

/// One class prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class_id: i64,
    pub class_name: String,
    pub confidence: f64,
}

/// `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<Prediction>,
    pub device_used: String,
    pub inference_time_ms: f64,
}

/// `POST /predict/batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictResponse {
    pub results: Vec<JsonValue>,
    pub total_images: u64,
}

/// Decode the JSON payload of an outcome into `T`
pub fn decode<T: DeserializeOwned>(outcome: &RequestOutcome) -> Result<T, ApiError> {
    let payload = outcome
        .payload()
        .ok_or_else(|| ApiError::Protocol("response body is not JSON".to_string()))?;
    T::deserialize(payload).map_err(|e| ApiError::Protocol(e.to_string()))
}

impl HealthResponse {
    pub fn from_outcome(outcome: &RequestOutcome) -> Result<Self, ApiError> {
        let health: Self = decode(outcome)?;
        if !health.is_healthy() {
            return Err(ApiError::Protocol(format!(
                "status is '{}', expected 'healthy'",
                health.status
            )));
        }
        Ok(health)
    }
}

impl PredictResponse {
    pub fn from_outcome(outcome: &RequestOutcome) -> Result<Self, ApiError> {
        let response: Self = decode(outcome)?;
        if response.predictions.is_empty() {
            return Err(ApiError::Protocol("predictions is empty".to_string()));
        }
        Ok(response)
    }
}

impl BatchPredictResponse {
    /// Decode and check that every uploaded file was accounted for
    pub fn from_outcome(outcome: &RequestOutcome, uploaded: usize) -> Result<Self, ApiError> {
        let response: Self = decode(outcome)?;
        if response.total_images != uploaded as u64 {
            return Err(ApiError::Protocol(format!(
                "total_images is {}, expected {}",
                response.total_images, uploaded
            )));
        }
        Ok(response)
    }
}

/// Check a plain-text metrics exposition for a marker
pub fn check_metrics(outcome: &RequestOutcome, marker: &str) -> Result<(), ApiError> {
    let text = outcome
        .body_text()
        .ok_or_else(|| ApiError::Protocol("metrics body is empty or not plain text".to_string()))?;
    if text.contains(marker) {
        Ok(())
    } else {
        Err(ApiError::Protocol(format!(
            "metrics do not mention '{}'",
            marker
        )))
    }
}

/// Read a numeric field from a JSON payload
pub fn numeric_field(payload: &JsonValue, field: &str) -> Option<f64> {
    payload.get(field).and_then(JsonValue::as_f64)
}
