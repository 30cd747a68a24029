//! Per-archive processing: filter, plan, decode, clean up
//!
//! Every per-archive failure is turned into an [`ExtractionOutcome`] here; nothing
//! past this point has to deal with extraction errors.

use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::extraction::decode_blocking;
use crate::planner::PathPlanner;
use crate::types::{
    ArchiveKind, ExtractMode, ExtractionOutcome, OutcomeStatus, WatchPolicy, is_extractable,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// Turns one archive path plus its policy into an outcome
#[derive(Clone, Debug, Default)]
pub struct ExtractionExecutor {
    /// Leave the source archive in place when decoding fails
    keep_failed_archives: bool,
}

impl ExtractionExecutor {
    /// Create an executor from the extraction settings
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            keep_failed_archives: config.keep_failed_archives,
        }
    }

    /// Process one file written into a watched directory.
    ///
    /// Returns `None` without touching the filesystem when the file is not an archive,
    /// carries the `noextract` marker, or the policy names an unknown extraction mode.
    /// Otherwise exactly one outcome is returned.
    ///
    /// The source archive is deleted after every decode attempt unless
    /// `keep_failed_archives` is set and decoding failed. A planning failure never
    /// deletes the source, since nothing was attempted.
    pub async fn process(&self, path: &Path, policy: &WatchPolicy) -> Option<ExtractionOutcome> {
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                debug!(?path, "skipping file without a UTF-8 name");
                return None;
            }
        };

        if !is_extractable(&file_name) {
            debug!(?path, "not an extractable archive, skipping");
            return None;
        }

        if let ExtractMode::Unknown(mode) = &policy.mode {
            warn!(
                ?path,
                mode = %mode,
                product_line = %policy.product_line,
                "unknown extraction mode, leaving archive untouched"
            );
            return None;
        }

        let kind = ArchiveKind::from_file_name(&file_name);
        info!(
            ?path,
            ?kind,
            mode = %policy.mode,
            product_line = %policy.product_line,
            "processing archive"
        );

        let (target_dir, result) = match PathPlanner::plan(path, &policy.mode) {
            Ok(target) => {
                let result = decode_blocking(kind, path, &target).await.map(|_| ());
                self.cleanup(path, &result).await;
                (Some(target), result)
            }
            Err(e) => (None, Err(e)),
        };

        let status = match &result {
            Ok(()) => OutcomeStatus::Success,
            Err(e) => {
                warn!(?path, error = %e, kind = e.kind(), "archive extraction failed");
                OutcomeStatus::from(e)
            }
        };

        Some(ExtractionOutcome {
            file_name,
            archive_path: path.to_path_buf(),
            mode: policy.mode.clone(),
            product_line: policy.product_line.clone(),
            target_dir,
            status,
            processed_at: chrono::Utc::now(),
        })
    }

    /// Remove the source archive after a decode attempt. Failures are only logged.
    async fn cleanup(&self, path: &Path, result: &Result<(), ExtractionError>) {
        if result.is_err() && self.keep_failed_archives {
            info!(?path, "keeping archive after failed extraction");
            return;
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => info!(?path, "deleted source archive"),
            Err(e) => warn!(?path, error = %e, "failed to delete source archive"),
        }
    }
}
