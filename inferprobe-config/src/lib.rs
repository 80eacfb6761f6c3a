//! Domain-driven configuration for inferprobe
//!
//! Configuration is split by concern (target service, readiness, monitoring,
//! load, stress, logging). Every domain has defaults, validation and
//! environment variable overrides applied by [`ConfigLoader`].

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    load::LoadConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    monitor::MonitorConfig,
    readiness::ReadinessConfig,
    stress::StressConfig,
    target::TargetConfig,
    InferProbeConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration_ms;
