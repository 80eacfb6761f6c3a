//! HTTP error types

use crate::types::HttpMethodError;
use std::path::PathBuf;

/// Error type for HTTP setup and request construction.
///
/// Failures of an issued request are never surfaced through this type; they
/// become failed [`inferprobe_core::RequestOutcome`]s.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(#[from] HttpMethodError),

    #[error("Test image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
