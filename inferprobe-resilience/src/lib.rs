//! Resilience patterns for inferprobe
//!
//! Fixed-interval readiness polling, the circuit breaker that halts an
//! escalating stress sequence, and the shutdown signal observed between
//! stages.

pub mod circuit_breaker;
pub mod readiness;
pub mod shutdown;

// Re-export commonly used types
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use readiness::{wait_until_ready, ProbeError, ReadinessPolicy, ReadinessProber, ReadinessResult};
pub use shutdown::ShutdownSignal;
