//! Core types shared across the watch-to-extraction pipeline

use crate::error::ExtractionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Archive suffixes recognized for extraction, longest first.
///
/// Order matters: `.tar.gz` must be tried before `.tar` could ever be considered.
const SUPPORTED_SUFFIXES: &[(&str, ArchiveKind)] = &[
    (".tar.gz", ArchiveKind::TarGz),
    (".tgz", ArchiveKind::TarGz),
    (".zip", ArchiveKind::Zip),
    (".tar", ArchiveKind::Tar),
    (".rar", ArchiveKind::Rar),
];

/// Filename marker that opts a file out of extraction
pub const NO_EXTRACT_MARKER: &str = "noextract";

/// Archive type detected from the filename suffix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// ZIP archive (.zip)
    Zip,
    /// Uncompressed tar archive (.tar)
    Tar,
    /// Gzip-compressed tar archive (.tar.gz, .tgz)
    TarGz,
    /// RAR archive (.rar)
    Rar,
    /// Anything else
    Unsupported,
}

impl ArchiveKind {
    /// Resolve the archive kind from a file name using the longest matching suffix.
    ///
    /// Matching is case-insensitive. Names without a recognized suffix resolve to
    /// [`ArchiveKind::Unsupported`].
    ///
    /// ```
    /// use auto_unpack::types::ArchiveKind;
    ///
    /// assert_eq!(ArchiveKind::from_file_name("a.tar.gz"), ArchiveKind::TarGz);
    /// assert_eq!(ArchiveKind::from_file_name("a.TAR"), ArchiveKind::Tar);
    /// assert_eq!(ArchiveKind::from_file_name("a.txt"), ArchiveKind::Unsupported);
    /// ```
    pub fn from_file_name(file_name: &str) -> Self {
        Self::match_suffix(file_name)
            .map(|(_, kind)| kind)
            .unwrap_or(ArchiveKind::Unsupported)
    }

    /// Strip the recognized suffix from a file name, keeping the original case.
    ///
    /// Returns `None` when the name has no supported suffix or would be empty.
    pub fn strip_suffix(file_name: &str) -> Option<&str> {
        let (suffix, _) = Self::match_suffix(file_name)?;
        let stem = &file_name[..file_name.len() - suffix.len()];
        (!stem.is_empty()).then_some(stem)
    }

    fn match_suffix(file_name: &str) -> Option<(&'static str, ArchiveKind)> {
        let lower = file_name.to_ascii_lowercase();
        SUPPORTED_SUFFIXES
            .iter()
            .find(|(suffix, _)| lower.ends_with(suffix))
            .copied()
    }
}

/// Check whether a file name qualifies for extraction.
///
/// A file qualifies when it ends with a supported suffix (case-insensitive) and does
/// not contain the [`NO_EXTRACT_MARKER`] anywhere in its name (case-insensitive).
pub fn is_extractable(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    ArchiveKind::from_file_name(file_name) != ArchiveKind::Unsupported
        && !lower.contains(NO_EXTRACT_MARKER)
}

/// Where extracted content lands
///
/// Parsed leniently: unrecognized names are kept as [`ExtractMode::Unknown`] so the
/// executor can report them instead of the configuration loader rejecting them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExtractMode {
    /// Flattened into the grandparent of the archive
    Direct,
    /// Isolated into a freshly named sibling of the staging directory
    #[default]
    Nested,
    /// Any other configured value, kept verbatim
    Unknown(String),
}

impl ExtractMode {
    /// Configuration name of the mode
    pub fn as_str(&self) -> &str {
        match self {
            ExtractMode::Direct => "direct",
            ExtractMode::Nested => "nested",
            ExtractMode::Unknown(name) => name,
        }
    }

    /// Human-readable description used in notifications
    pub fn description(&self) -> &str {
        match self {
            ExtractMode::Direct => "direct (flattened)",
            ExtractMode::Nested => "nested (isolated)",
            ExtractMode::Unknown(_) => "unknown mode",
        }
    }
}

impl From<String> for ExtractMode {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => ExtractMode::Direct,
            "nested" => ExtractMode::Nested,
            _ => ExtractMode::Unknown(value),
        }
    }
}

impl From<&str> for ExtractMode {
    fn from(value: &str) -> Self {
        ExtractMode::from(value.to_string())
    }
}

impl From<ExtractMode> for String {
    fn from(mode: ExtractMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction policy attached to one watched directory
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchPolicy {
    /// The watched staging directory
    pub directory: PathBuf,
    /// Where extracted content lands
    pub mode: ExtractMode,
    /// Product line the directory belongs to
    pub product_line: String,
    /// Notification destination (webhook URL); `None` disables notification
    pub notification_target: Option<String>,
}

/// Final state of one processed archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Archive extracted
    Success,
    /// Planning or decoding failed
    Failure {
        /// Error category (see [`ExtractionError::kind`])
        kind: &'static str,
        /// Human-readable reason
        reason: String,
    },
}

impl OutcomeStatus {
    /// Whether the archive was extracted
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }
}

impl From<&ExtractionError> for OutcomeStatus {
    fn from(error: &ExtractionError) -> Self {
        OutcomeStatus::Failure {
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => f.write_str("success"),
            OutcomeStatus::Failure { reason, .. } => write!(f, "failed: {}", reason),
        }
    }
}

/// Immutable record of what happened to one archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Archive file name (final path component)
    pub file_name: String,
    /// Full path the archive was found at
    pub archive_path: PathBuf,
    /// Extraction mode that was applied
    pub mode: ExtractMode,
    /// Product line owning the watched directory
    pub product_line: String,
    /// Target directory, when planning succeeded
    pub target_dir: Option<PathBuf>,
    /// Result of the extraction
    pub status: OutcomeStatus,
    /// When processing finished
    pub processed_at: DateTime<Utc>,
}

/// Kind of filesystem change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsEventKind {
    /// A file opened for writing was closed
    CloseWrite,
    /// A file or directory was created
    Create,
    /// Content or metadata changed while a file is still open
    Modify,
    /// A file or directory was removed
    Remove,
    /// Anything else (access, rename, ...)
    Other,
}

/// A single filesystem change inside a watched directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSystemEvent {
    /// Directory the change happened in
    pub directory: PathBuf,
    /// Name of the changed entry
    pub file_name: String,
    /// What happened
    pub kind: FsEventKind,
}

impl FileSystemEvent {
    /// Full path of the changed entry
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Whether this event reports a fully written file
    pub fn is_write_complete(&self) -> bool {
        self.kind == FsEventKind::CloseWrite
    }
}
