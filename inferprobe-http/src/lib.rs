//! HTTP functionality for inferprobe
//!
//! The [`RequestExecutor`] trait is the single seam through which every
//! higher component talks to the service under test. [`ReqwestExecutor`] is
//! the production implementation; tests substitute scripted executors.

pub mod api;
pub mod config;
pub mod errors;
pub mod executor;
pub mod request;
pub mod types;

// Re-export main types for convenience
pub use api::{
    ApiError, BatchPredictResponse, DevicesResponse, HealthResponse, PredictResponse, Prediction,
    RootResponse,
};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use executor::{RequestExecutor, ReqwestExecutor, MAX_BODY_TEXT_BYTES};
pub use request::{FilePart, HttpRequest, RequestBody};
pub use types::{HttpMethod, HttpMethodError};
