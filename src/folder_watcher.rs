//! Directory watching and archive dispatch
//!
//! The [`WatchDispatcher`] registers every configured staging directory with the
//! platform filesystem watcher (inotify on Linux), then consumes change events one at a
//! time. Only "file closed after writing" events trigger processing; everything else is
//! ignored. Each qualifying file is handed to the [`ExtractionExecutor`] and the
//! resulting outcome is forwarded to the notification sink without waiting for
//! delivery.
//!
//! Lifecycle: `Idle` (constructed) -> `Watching` (after [`WatchDispatcher::start`]) ->
//! `Stopped` (cancellation or a broken event stream).
//!
//! # Example
//!
//! ```no_run
//! use auto_unpack::config::Config;
//! use auto_unpack::folder_watcher::WatchDispatcher;
//! use tokio_util::sync::CancellationToken;
//! use std::path::Path;
//!
//! # async fn example() -> auto_unpack::Result<()> {
//! let config = Config::load(Path::new("config.yaml"))?;
//! let mut dispatcher = WatchDispatcher::from_config(&config)?;
//! dispatcher.start();
//!
//! let cancel = CancellationToken::new();
//! // Runs until `cancel` fires or the event stream breaks
//! let reason = dispatcher.run(cancel).await;
//! println!("stopped: {:?}", reason);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::ExtractionExecutor;
use crate::notification::{NotificationSink, WebhookNotifier};
use crate::types::{ExtractionOutcome, FileSystemEvent, FsEventKind, WatchPolicy};
use notify::event::{AccessKind, AccessMode};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Monitoring session state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatcherState {
    /// Constructed, no directories registered yet
    Idle,
    /// Directories registered, events being consumed
    Watching,
    /// Loop exited; the dispatcher cannot be restarted
    Stopped,
}

/// Why the monitoring loop ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// External cancellation (interrupt signal)
    Cancelled,
    /// The watcher reported an error; the stream is not resumed
    StreamError(String),
    /// The event channel closed
    StreamClosed,
}

/// Watches staging directories and dispatches finished archives for extraction
pub struct WatchDispatcher {
    /// Filesystem watcher instance
    watcher: RecommendedWatcher,

    /// Channel for receiving filesystem events
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,

    /// Configured policies, keyed by directory. Only registered directories remain
    /// after `start`.
    policies: HashMap<PathBuf, WatchPolicy>,

    /// Policy used for events from directories that are not registered
    fallback_policy: WatchPolicy,

    /// Per-archive processing
    executor: ExtractionExecutor,

    /// Where outcomes go
    sink: Arc<dyn NotificationSink>,

    state: DispatcherState,
}

impl WatchDispatcher {
    /// Create a dispatcher for the given policies
    ///
    /// # Errors
    /// Returns error if the filesystem watcher cannot be initialized
    pub fn new(
        policies: Vec<WatchPolicy>,
        executor: ExtractionExecutor,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("Failed to send filesystem event: {}", e);
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| {
            Error::WatchStream(format!("failed to initialize filesystem watcher: {}", e))
        })?;

        // Events always carry absolute paths, so relative directories are resolved
        // against the current working directory before they become lookup keys
        let policies = policies
            .into_iter()
            .map(|mut policy| {
                match std::path::absolute(&policy.directory) {
                    Ok(absolute) => policy.directory = absolute,
                    Err(e) => warn!(
                        path = ?policy.directory,
                        error = %e,
                        "cannot resolve watch directory to an absolute path"
                    ),
                }
                (policy.directory.clone(), policy)
            })
            .collect();

        Ok(Self {
            watcher,
            rx,
            policies,
            fallback_policy: WatchPolicy::default(),
            executor,
            sink,
            state: DispatcherState::Idle,
        })
    }

    /// Create a dispatcher from a loaded configuration, notifying through webhooks
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.policies(),
            ExtractionExecutor::new(&config.extraction),
            Arc::new(WebhookNotifier::new(config.notification_timeout)),
        )
    }

    /// Current lifecycle state
    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Directories currently registered with the watcher
    pub fn watched_directories(&self) -> impl Iterator<Item = &Path> {
        self.policies.keys().map(PathBuf::as_path)
    }

    /// Register every configured directory with the watcher
    ///
    /// A directory that cannot be watched (missing, permission denied) is logged and
    /// dropped; the remaining directories are still registered. Returns the number of
    /// directories being watched.
    pub fn start(&mut self) -> usize {
        let mut failed = Vec::new();

        for policy in self.policies.values() {
            match self
                .watcher
                .watch(&policy.directory, RecursiveMode::NonRecursive)
            {
                Ok(()) => info!(
                    path = ?policy.directory,
                    product_line = %policy.product_line,
                    mode = %policy.mode,
                    "watching directory"
                ),
                Err(e) => {
                    let err = Error::WatchRegistration {
                        path: policy.directory.clone(),
                        reason: e.to_string(),
                    };
                    error!(error = %err, "directory excluded from watching");
                    failed.push(policy.directory.clone());
                }
            }
        }

        for path in failed {
            self.policies.remove(&path);
        }

        self.state = DispatcherState::Watching;
        info!(count = self.policies.len(), "watch dispatcher ready");
        self.policies.len()
    }

    /// Run the event loop until cancelled or the event stream breaks
    ///
    /// Events are processed one at a time; an extraction in progress always finishes
    /// before cancellation is observed.
    pub async fn run(mut self, cancel: CancellationToken) -> StopReason {
        if self.state == DispatcherState::Idle {
            warn!("event loop started before any directory was registered");
        }
        info!("watch dispatcher started");

        let reason = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break StopReason::Cancelled,

                next = self.rx.recv() => match next {
                    Some(Ok(event)) => {
                        for fs_event in convert_event(event) {
                            if cancel.is_cancelled() {
                                break;
                            }
                            self.handle_event(&fs_event).await;
                        }
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "filesystem watcher error, stopping");
                        break StopReason::StreamError(e.to_string());
                    }
                    None => {
                        error!("filesystem event channel closed, stopping");
                        break StopReason::StreamClosed;
                    }
                }
            }
        };

        self.state = DispatcherState::Stopped;
        info!(?reason, "watch dispatcher stopped");
        reason
    }

    /// Handle one filesystem event
    ///
    /// Returns the outcome when the event led to an extraction attempt.
    async fn handle_event(&self, event: &FileSystemEvent) -> Option<ExtractionOutcome> {
        if !event.is_write_complete() {
            trace!(?event, "ignoring event");
            return None;
        }

        let path = event.path();
        if !path.is_file() {
            debug!(?path, "file no longer present, ignoring event");
            return None;
        }

        let policy = self.policy_for(&event.directory);
        let outcome = self.executor.process(&path, policy).await?;
        self.dispatch_notification(outcome.clone(), policy.notification_target.clone());
        Some(outcome)
    }

    /// Find the policy owning a directory, falling back to the default nested policy
    fn policy_for(&self, directory: &Path) -> &WatchPolicy {
        self.policies.get(directory).unwrap_or_else(|| {
            debug!(?directory, "event from unregistered directory, using default policy");
            &self.fallback_policy
        })
    }

    /// Hand the outcome to the sink without waiting for delivery
    fn dispatch_notification(&self, outcome: ExtractionOutcome, target: Option<String>) {
        info!(
            file = %outcome.file_name,
            product_line = %outcome.product_line,
            mode = %outcome.mode,
            status = %outcome.status,
            processed_at = %outcome.processed_at.to_rfc3339(),
            "archive processed"
        );

        let Some(target) = target else {
            debug!(file = %outcome.file_name, "no notification target configured");
            return;
        };

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.deliver(&outcome, &target).await {
                warn!(
                    sink = sink.name(),
                    url = %target,
                    file = %outcome.file_name,
                    error = %e,
                    "notification failed"
                );
            }
        });
    }
}

/// Translate a raw watcher event into per-file events, dropping duplicate paths
pub fn convert_event(event: Event) -> Vec<FileSystemEvent> {
    let kind = match event.kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => FsEventKind::CloseWrite,
        EventKind::Create(_) => FsEventKind::Create,
        EventKind::Modify(_) => FsEventKind::Modify,
        EventKind::Remove(_) => FsEventKind::Remove,
        _ => FsEventKind::Other,
    };

    let mut seen = HashSet::new();
    event
        .paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .filter_map(|path| {
            let directory = path.parent()?.to_path_buf();
            let file_name = path.file_name()?.to_str()?.to_string();
            Some(FileSystemEvent {
                directory,
                file_name,
                kind,
            })
        })
        .collect()
}
