use crate::error::ExtractionError;
use crate::types::ArchiveKind;
use std::path::{Component, Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::info;

/// Run [`decode`](super::decode) on the blocking thread pool and wait for it.
///
/// Extraction is synchronous file I/O; this keeps it off the async runtime while the
/// caller still processes one archive at a time.
pub async fn decode_blocking(
    kind: ArchiveKind,
    archive_path: &Path,
    dest_path: &Path,
) -> Result<Vec<PathBuf>, ExtractionError> {
    let archive_path_owned = archive_path.to_path_buf();
    let dest_path_owned = dest_path.to_path_buf();

    let files = spawn_blocking(move || super::decode(kind, &archive_path_owned, &dest_path_owned))
        .await
        .map_err(|e| {
            ExtractionError::io(
                archive_path,
                std::io::Error::other(format!("extraction task panicked: {}", e)),
            )
        })??;

    info!(
        ?archive_path,
        ?dest_path,
        extracted_count = files.len(),
        "{:?} extraction successful",
        kind
    );

    Ok(files)
}

/// Reduce an entry name to its normal components so it cannot escape the target.
///
/// Returns `None` if nothing remains (e.g. `..` or `/`).
#[cfg_attr(not(feature = "rar"), allow(dead_code))]
pub(crate) fn sanitize_entry_path(name: &Path) -> Option<PathBuf> {
    let sanitized = name
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect::<PathBuf>();

    (!sanitized.as_os_str().is_empty()).then_some(sanitized)
}

/// Create the parent directories of an extracted file
pub(crate) fn ensure_parent(
    file_path: &Path,
    archive_path: &Path,
) -> Result<(), ExtractionError> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExtractionError::io(archive_path, e))?;
    }
    Ok(())
}
