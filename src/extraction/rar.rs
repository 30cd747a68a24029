use crate::error::ExtractionError;
use std::path::{Path, PathBuf};

/// Archive extractor for RAR files
///
/// Backed by the native `unrar` library. Builds without the `rar` feature report every
/// RAR archive as [`ExtractionError::UnsupportedFormat`].
pub struct RarExtractor;

#[cfg(feature = "rar")]
impl RarExtractor {
    /// Check if an unrar error indicates an encrypted archive
    fn is_password_error(error_msg: &str) -> bool {
        error_msg.contains("password")
            || error_msg.contains("encrypted")
            || error_msg.contains("ERAR_BAD_PASSWORD")
            || error_msg.contains("ERAR_MISSING_PASSWORD")
    }

    /// Convert an unrar error to our error type
    fn convert_unrar_error(e: unrar::error::UnrarError, archive_path: &Path) -> ExtractionError {
        let err_str = e.to_string();
        if Self::is_password_error(&err_str) {
            ExtractionError::UnsupportedFormat {
                archive: archive_path.to_path_buf(),
                reason: format!("encrypted RAR archives are not supported: {}", err_str),
            }
        } else {
            ExtractionError::corrupt(archive_path, err_str)
        }
    }

    /// Extract every entry of a RAR archive into `dest_path`
    pub fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        use super::shared::{ensure_parent, sanitize_entry_path};
        use tracing::{debug, info, warn};

        debug!(?archive_path, ?dest_path, "attempting RAR extraction");

        let processor = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(|e| Self::convert_unrar_error(e, archive_path))?;

        let mut extracted_files = Vec::new();

        // Process each entry using the state machine interface
        let mut at_header = processor;
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry_processor)) => entry_processor,
                Ok(None) => break,
                Err(e) => return Err(Self::convert_unrar_error(e, archive_path)),
            };

            let header = at_file.entry();
            let sanitized = sanitize_entry_path(Path::new(&header.filename));

            match sanitized {
                Some(relative) if !header.is_directory() => {
                    let file_path = dest_path.join(&relative);
                    ensure_parent(&file_path, archive_path)?;
                    at_header = at_file
                        .extract_to(&file_path)
                        .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                    extracted_files.push(file_path);
                }
                Some(relative) => {
                    std::fs::create_dir_all(dest_path.join(relative))
                        .map_err(|e| ExtractionError::io(archive_path, e))?;
                    at_header = at_file
                        .skip()
                        .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                }
                None => {
                    warn!(entry = ?header.filename, "skipping entry with unsafe path");
                    at_header = at_file
                        .skip()
                        .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                }
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "RAR extraction successful"
        );

        Ok(extracted_files)
    }
}

#[cfg(not(feature = "rar"))]
impl RarExtractor {
    /// RAR support is not compiled in
    pub fn extract(archive_path: &Path, _dest_path: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        tracing::warn!(?archive_path, "RAR support not compiled in");
        Err(ExtractionError::UnsupportedFormat {
            archive: archive_path.to_path_buf(),
            reason: "built without the `rar` feature".to_string(),
        })
    }
}
