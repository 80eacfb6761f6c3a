//! inferprobe execution engine
//!
//! Everything that issues more than one request lives here: the batched
//! [`LoadGenerator`], the [`HealthMonitor`], the [`StageOrchestrator`] that
//! escalates load across stages, the single-request benchmark and the
//! endpoint contract checks. All of them talk to the service only through a
//! shared [`inferprobe_http::RequestExecutor`].

pub mod benchmark;
pub mod endpoints;
pub mod error;
pub mod load;
pub mod monitor;
pub mod orchestrator;
pub mod prediction;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use benchmark::SingleBenchmark;
pub use endpoints::{EndpointCheck, EndpointChecker};
pub use error::{ExecutionError, ExecutionResult};
pub use load::{aggregate_load, batch_sizes, LoadGenerator, LoadRun};
pub use monitor::{monitor, HealthMonitor};
pub use orchestrator::StageOrchestrator;
pub use prediction::PredictionTarget;
