//! # auto-unpack
//!
//! Watches staging directories for finished archive uploads, unpacks them next to the
//! upload location, removes the source archive, and reports each outcome to the
//! product line's webhook.
//!
//! ## Pipeline
//!
//! - **Watch** - one non-recursive watch per configured directory; only
//!   "closed after writing" events trigger work
//! - **Filter** - names must end in `.zip`, `.tar`, `.tar.gz`, `.tgz` or `.rar` and
//!   must not contain `noextract`
//! - **Plan** - `direct` mode unpacks into the parent of the watched directory,
//!   `nested` mode into a fresh, collision-free subdirectory named after the archive
//! - **Decode** - zip, tar (gzip detected from content) and rar
//! - **Notify** - a markdown table row per archive, delivered without blocking the loop
//!
//! ## Quick Start
//!
//! ```no_run
//! use auto_unpack::{Config, WatchDispatcher, run_until_shutdown};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.yaml"))?;
//!
//!     let mut dispatcher = WatchDispatcher::from_config(&config)?;
//!     dispatcher.start();
//!
//!     // Run until SIGINT/SIGTERM
//!     run_until_shutdown(dispatcher).await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Per-archive processing
pub mod executor;
/// Archive extraction
pub mod extraction;
/// Directory watching and dispatch
pub mod folder_watcher;
/// Outcome notifications
pub mod notification;
/// Extraction target planning
pub mod planner;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, ExtractionConfig, ProductLineConfig, WatchDirectoryConfig};
pub use error::{Error, ExtractionError, NotificationError, Result};
pub use executor::ExtractionExecutor;
pub use folder_watcher::{DispatcherState, StopReason, WatchDispatcher};
pub use notification::{NotificationSink, WebhookNotifier};
pub use planner::PathPlanner;
pub use types::{
    ArchiveKind, ExtractMode, ExtractionOutcome, FileSystemEvent, FsEventKind, OutcomeStatus,
    WatchPolicy,
};

use tokio_util::sync::CancellationToken;

/// Helper function to run the dispatcher with graceful signal handling.
///
/// Waits for a termination signal and then cancels the event loop. An archive being
/// processed when the signal arrives is finished first.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_until_shutdown(dispatcher: WatchDispatcher) -> StopReason {
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        wait_for_signal().await;
        signal_token.cancel();
    });

    let reason = dispatcher.run(cancel).await;
    signal_task.abort();
    reason
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
