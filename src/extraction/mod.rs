//! Archive decoding
//!
//! Maps an [`ArchiveKind`] to the extractor for that container format. ZIP and tar
//! (plain, gzip, bzip2 or xz) are decoded natively; RAR goes through the native
//! `unrar` library when the `rar` feature is enabled.

mod rar;
mod shared;
mod tar;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use self::rar::RarExtractor;
pub use self::tar::TarExtractor;
pub use self::zip::ZipExtractor;
pub use shared::decode_blocking;

use crate::error::ExtractionError;
use crate::types::ArchiveKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extract an archive into an existing target directory
///
/// Returns the files written. [`ArchiveKind::Unsupported`] is a no-op: callers filter
/// names with [`is_extractable`](crate::types::is_extractable) first.
///
/// # Example
/// ```no_run
/// use auto_unpack::extraction::decode;
/// use auto_unpack::types::ArchiveKind;
/// use std::path::Path;
///
/// let files = decode(
///     ArchiveKind::Zip,
///     Path::new("/data/line-a/incoming/release-3.zip"),
///     Path::new("/data/release-3"),
/// )?;
/// println!("extracted {} files", files.len());
/// # Ok::<(), auto_unpack::error::ExtractionError>(())
/// ```
pub fn decode(
    kind: ArchiveKind,
    archive_path: &Path,
    dest_path: &Path,
) -> Result<Vec<PathBuf>, ExtractionError> {
    debug!(?archive_path, ?dest_path, ?kind, "dispatching extraction");

    match kind {
        ArchiveKind::Zip => ZipExtractor::extract(archive_path, dest_path),
        ArchiveKind::Tar | ArchiveKind::TarGz => TarExtractor::extract(archive_path, dest_path),
        ArchiveKind::Rar => RarExtractor::extract(archive_path, dest_path),
        ArchiveKind::Unsupported => {
            debug!(?archive_path, "no extractor for archive, nothing to do");
            Ok(Vec::new())
        }
    }
}
