use crate::error::ExtractionError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::result::ZipError;

use super::shared::ensure_parent;

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Convert a zip crate error into an extraction error
    fn convert_zip_error(e: ZipError, archive_path: &Path) -> ExtractionError {
        match e {
            ZipError::Io(io) => ExtractionError::io(archive_path, io),
            ZipError::UnsupportedArchive(reason) => ExtractionError::UnsupportedFormat {
                archive: archive_path.to_path_buf(),
                reason: reason.to_string(),
            },
            other => ExtractionError::corrupt(archive_path, other.to_string()),
        }
    }

    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
    ) -> Result<Option<PathBuf>, ExtractionError> {
        let file_path = match file.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(entry = file.name(), "skipping entry with unsafe path");
                return Ok(None);
            }
        };

        if file.is_dir() {
            std::fs::create_dir_all(&file_path)
                .map_err(|e| ExtractionError::io(archive_path, e))?;
            return Ok(None);
        }

        ensure_parent(&file_path, archive_path)?;

        let mut outfile = std::fs::File::create(&file_path)
            .map_err(|e| ExtractionError::io(archive_path, e))?;

        // Decompression failures surface as io errors from the entry reader
        std::io::copy(&mut file, &mut outfile).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
                ExtractionError::corrupt(
                    archive_path,
                    format!("failed to decompress {}: {}", file.name(), e),
                )
            }
            _ => ExtractionError::io(archive_path, e),
        })?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| ExtractionError::io(archive_path, e))?;
        }

        Ok(Some(file_path))
    }

    /// Extract every entry of a ZIP archive into `dest_path`, preserving relative paths
    pub fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        let file =
            std::fs::File::open(archive_path).map_err(|e| ExtractionError::io(archive_path, e))?;

        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| Self::convert_zip_error(e, archive_path))?;

        let mut extracted_files = Vec::new();

        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| Self::convert_zip_error(e, archive_path))?;

            if let Some(file_path) = Self::extract_zip_entry(file, dest_path, archive_path)? {
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "ZIP extraction successful"
        );

        Ok(extracted_files)
    }
}
