//! Logging setup for inferprobe
//!
//! Library crates log through `tracing` (or `log`, which the subscriber
//! bridges). Logs go to stderr so that report output on stdout stays
//! machine-readable.

use anyhow::Result;
use inferprobe_config::{LogFormat, LogLevel, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Filter directive for a level: our crates at `level`, dependencies at warn
pub fn filter_directive(level: LogLevel) -> String {
    format!("warn,inferprobe={}", level)
}

/// Initialize tracing from configuration.
///
/// `RUST_LOG` takes precedence when set. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(config.effective_level())))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    // Use try_init to avoid panic if global subscriber already set
    let initialized = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    if initialized.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(LogLevel::Debug), "warn,inferprobe=debug");
        assert!(EnvFilter::try_new(filter_directive(LogLevel::Trace)).is_ok());
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        let config = LoggingConfig {
            verbose: true,
            ..LoggingConfig::default()
        };
        assert!(init_logging_from_config(&config).is_ok());
        assert!(init_logging_from_config(&config).is_ok());
    }
}
