//! Core result model and statistics for inferprobe
//!
//! This crate contains the records produced while probing, monitoring and
//! load testing an inference service, and the pure statistics that reduce
//! them. It performs no I/O and has minimal dependencies.

pub mod error;
pub mod model;
pub mod outcome;
pub mod stats;

// Re-export commonly used types at the crate root
pub use error::{StatsError, StatsResult};
pub use model::{
    HealthReport, HealthSample, HealthSummary, LoadResult, ProbeAttempt, StageOutcome, StageReport,
    StageSpec, StressReport,
};
pub use outcome::{ErrorKind, RequestOutcome};
pub use stats::{aggregate, AggregateStats, FailureBreakdown, Sample};
