//! Core error types for inferprobe

use thiserror::Error;

/// Result type for statistics operations
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors raised while reducing samples into statistics
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatsError {
    /// No successful sample was available to compute latency statistics from.
    /// Callers report this as "all requests failed" rather than printing
    /// zero-filled numbers.
    #[error("Insufficient data: {successes} successful samples out of {samples}")]
    InsufficientData { samples: usize, successes: usize },
}

impl StatsError {
    /// Whether every request in the sample set failed (as opposed to no
    /// request having been issued at all)
    pub fn all_failed(&self) -> bool {
        match self {
            StatsError::InsufficientData { samples, .. } => *samples > 0,
        }
    }
}
