use anyhow::{Context as _, Result};
use clap::Parser;
use colored::*;
use inferprobe_config::{ConfigLoader, InferProbeConfig, LogLevel};
use inferprobe_http::{HttpConfig, ReqwestExecutor};
use inferprobe_logging::init_logging_from_config;
use inferprobe_resilience::ShutdownSignal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

mod cli;
mod commands;
mod presenter;
mod report;

use cli::{Cli, Commands};
use commands::Context;
use presenter::Presenter;

/// Exit status for configuration and setup errors
const SETUP_ERROR: u8 = 2;

/// Exit status after a forced second interrupt
const INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::SampleConfig = cli.command {
        print!("{}", InferProbeConfig::generate_sample());
        return ExitCode::SUCCESS;
    }

    let ctx = match setup(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{} {:#}", "✗".bright_red().bold(), e);
            return ExitCode::from(SETUP_ERROR);
        }
    };

    info!("Verifying service at {}", ctx.config.target.base_url);
    let report = commands::run(&cli.command, &ctx).await;

    if let Err(e) = ctx.presenter.finish(&report) {
        eprintln!("{} Failed to write report: {:#}", "✗".bright_red().bold(), e);
        return ExitCode::from(1);
    }

    report.exit_code()
}

/// Load configuration, start logging and build the HTTP executor
fn setup(cli: &Cli) -> Result<Context> {
    let config = build_config(cli)?;

    init_logging_from_config(&config.logging)?;
    debug!("Effective configuration: {:?}", config);

    let executor = ReqwestExecutor::new(&HttpConfig::from(&config.target))
        .context("Failed to build HTTP client")?;

    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_ctrl_c();
    exit_on_second_interrupt(shutdown.clone());

    Ok(Context {
        config,
        executor: Arc::new(executor),
        shutdown,
        presenter: Presenter::new(cli.output),
    })
}

/// File, then environment, then command-line flags. Validation runs once
/// all three layers are applied.
fn build_config(cli: &Cli) -> Result<InferProbeConfig> {
    let mut config = ConfigLoader::new()
        .load_unvalidated(cli.config.as_ref())
        .context("Failed to load configuration")?;

    apply_overrides(&mut config, cli)?;
    config.validate_all().context("Invalid configuration")?;
    Ok(config)
}

/// The first Ctrl-C stops the run gracefully; a second one exits at once
fn exit_on_second_interrupt(shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        shutdown.triggered().await;
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Interrupted again, exiting", "✗".bright_red().bold());
            std::process::exit(INTERRUPTED);
        }
    });
}

/// Command-line flags win over the file and the environment
fn apply_overrides(config: &mut InferProbeConfig, cli: &Cli) -> Result<()> {
    if let Some(level) = &cli.log_level {
        config.logging.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if cli.verbose {
        config.logging.verbose = true;
    }

    match &cli.command {
        Commands::Monitor {
            duration_ms,
            interval_ms,
        } => {
            if let Some(ms) = duration_ms {
                config.monitor.duration = Duration::from_millis(*ms);
            }
            if let Some(ms) = interval_ms {
                config.monitor.interval = Duration::from_millis(*ms);
            }
        }
        Commands::Load { concurrency, total } => {
            if let Some(n) = concurrency {
                config.load.concurrent_requests = *n;
            }
            if let Some(n) = total {
                config.load.total_requests = *n;
            }
        }
        Commands::Stress { cooldown_ms } => {
            if let Some(ms) = cooldown_ms {
                config.stress.cooldown = Duration::from_millis(*ms);
            }
        }
        _ => {}
    }

    Ok(())
}
