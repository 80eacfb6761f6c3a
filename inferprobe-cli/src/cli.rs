//! CLI argument parsing definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Readiness, health and load verification for inference services", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Verbose logging, including every readiness attempt and batch
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console, global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored report
    Console,
    /// One JSON document on stdout
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wait until the service answers its health check
    Ready,

    /// Sample the health endpoint for a fixed duration
    Monitor {
        /// Monitoring duration in milliseconds
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,

        /// Delay between samples in milliseconds
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },

    /// Warm up, then benchmark sequential prediction requests
    Single,

    /// Fixed-concurrency load test against the prediction endpoint
    Load {
        /// Requests in flight per batch
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,

        /// Total number of requests
        #[arg(long, value_name = "N")]
        total: Option<usize>,
    },

    /// Escalating stress test across the configured stages
    Stress {
        /// Pause between stages in milliseconds
        #[arg(long, value_name = "MS")]
        cooldown_ms: Option<u64>,
    },

    /// Readiness, endpoint checks, health monitoring, single-request
    /// benchmark and load test
    All,

    /// Print a sample configuration file
    SampleConfig,
}
