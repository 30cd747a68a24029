//! Error types for auto-unpack
//!
//! Errors fall into two groups:
//! - Session-level errors ([`Error`]) that abort startup or end the monitoring loop
//! - Per-archive errors ([`ExtractionError`]) that never unwind past the executor and
//!   are instead recorded in an [`ExtractionOutcome`](crate::types::ExtractionOutcome)

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for auto-unpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for auto-unpack
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "product_lines")
        key: Option<String>,
    },

    /// A directory could not be registered with the filesystem watcher
    #[error("failed to watch {path}: {reason}")]
    WatchRegistration {
        /// Directory that could not be watched
        path: PathBuf,
        /// Reason reported by the watch facility
        reason: String,
    },

    /// The filesystem event stream broke; the monitoring loop cannot continue
    #[error("watch stream error: {0}")]
    WatchStream(String),
}

impl Error {
    /// Build a configuration error tied to a specific key
    pub(crate) fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Errors raised while planning or decoding a single archive
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The extraction target directory could not be derived or created
    #[error("cannot plan extraction of {archive}: {reason}")]
    Planning {
        /// Archive being planned
        archive: PathBuf,
        /// Why no target directory could be produced
        reason: String,
    },

    /// The archive container is invalid or truncated
    #[error("corrupt archive {archive}: {reason}")]
    CorruptArchive {
        /// The corrupt archive
        archive: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// The archive format cannot be handled by this build
    #[error("unsupported archive format for {archive}: {reason}")]
    UnsupportedFormat {
        /// The archive that could not be decoded
        archive: PathBuf,
        /// Why the format is unsupported
        reason: String,
    },

    /// Reading the archive or writing extracted content failed
    #[error("I/O error while extracting {archive}: {source}")]
    Io {
        /// The archive being extracted
        archive: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ExtractionError {
    pub(crate) fn corrupt(archive: &std::path::Path, reason: impl Into<String>) -> Self {
        ExtractionError::CorruptArchive {
            archive: archive.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(archive: &std::path::Path, source: std::io::Error) -> Self {
        ExtractionError::Io {
            archive: archive.to_path_buf(),
            source,
        }
    }

    /// Short machine-readable category, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Planning { .. } => "planning",
            ExtractionError::CorruptArchive { .. } => "corrupt_archive",
            ExtractionError::UnsupportedFormat { .. } => "unsupported_format",
            ExtractionError::Io { .. } => "io",
        }
    }
}

/// Errors raised while delivering an outcome notification
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The HTTP request could not be sent
    #[error("failed to send notification: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("notification endpoint returned status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The endpoint did not answer in time
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}
