//! auto-unpack daemon
//!
//! Binary name: `auto-unpack`

use auto_unpack::{Config, StopReason, WatchDispatcher, run_until_shutdown};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Unpack archives dropped into watched staging directories
#[derive(Debug, Parser)]
#[command(name = "auto-unpack", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log filter (e.g. `debug` or `auto_unpack=trace`); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = ?args.config, error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut dispatcher = match WatchDispatcher::from_config(&config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            tracing::error!(error = %e, "failed to start watcher");
            return ExitCode::FAILURE;
        }
    };

    if dispatcher.start() == 0 {
        tracing::warn!("no directory could be watched, waiting for shutdown");
    }

    match run_until_shutdown(dispatcher).await {
        StopReason::Cancelled => ExitCode::SUCCESS,
        StopReason::StreamError(_) | StopReason::StreamClosed => ExitCode::FAILURE,
    }
}
