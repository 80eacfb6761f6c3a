//! Error types for load execution

use inferprobe_core::StatsError;
use inferprobe_http::HttpError;
use thiserror::Error;

/// Result type for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Execution errors.
///
/// Individual request failures are never reported here; they are recorded
/// as failed outcomes. These errors mean a run could not start or produced
/// nothing to report.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Stats(#[from] StatsError),
}
