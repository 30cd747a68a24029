use crate::error::ExtractionError;
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xz2::read::XzDecoder;

/// Longest magic sequence inspected
const MAGIC_LEN: u64 = 6;

/// Compression wrapper detected from the container bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TarCompression {
    /// Plain tar stream
    None,
    /// Gzip-compressed tar stream
    Gzip,
    /// Bzip2-compressed tar stream
    Bzip2,
    /// Xz-compressed tar stream
    Xz,
}

impl TarCompression {
    fn from_magic(magic: &[u8]) -> Self {
        match magic {
            [0x1F, 0x8B, ..] => TarCompression::Gzip,
            [b'B', b'Z', b'h', ..] => TarCompression::Bzip2,
            [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00, ..] => TarCompression::Xz,
            _ => TarCompression::None,
        }
    }
}

/// Archive extractor for tar files, plain or compressed with gzip, bzip2 or xz
pub struct TarExtractor;

impl TarExtractor {
    /// Inspect the leading bytes of the archive to decide how to read it.
    ///
    /// The file extension is not trusted: a `.tar` holding compressed data and a
    /// `.tar.gz` holding a plain tar stream are both read correctly.
    pub fn detect_compression<R: Read + Seek>(reader: &mut R) -> std::io::Result<TarCompression> {
        let mut magic = Vec::with_capacity(MAGIC_LEN as usize);
        reader.by_ref().take(MAGIC_LEN).read_to_end(&mut magic)?;
        reader.rewind()?;

        Ok(TarCompression::from_magic(&magic))
    }

    /// Map a tar or decompression read error to corrupt-archive or plain I/O failure
    fn convert_read_error(e: std::io::Error, archive_path: &Path) -> ExtractionError {
        match e.kind() {
            ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof => {
                ExtractionError::corrupt(archive_path, e.to_string())
            }
            // The tar crate reports malformed headers as ErrorKind::Other
            ErrorKind::Other => ExtractionError::corrupt(archive_path, e.to_string()),
            _ => ExtractionError::io(archive_path, e),
        }
    }

    /// Extract every entry of a tar archive into `dest_path`
    pub fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        debug!(?archive_path, ?dest_path, "attempting tar extraction");

        let mut file = File::open(archive_path).map_err(|e| ExtractionError::io(archive_path, e))?;

        if file
            .metadata()
            .map_err(|e| ExtractionError::io(archive_path, e))?
            .len()
            == 0
        {
            return Err(ExtractionError::corrupt(archive_path, "empty archive"));
        }

        let compression = Self::detect_compression(&mut file)
            .map_err(|e| ExtractionError::io(archive_path, e))?;
        debug!(?archive_path, ?compression, "detected tar compression");

        let reader = BufReader::new(file);
        let reader: Box<dyn Read> = match compression {
            TarCompression::None => Box::new(reader),
            TarCompression::Gzip => Box::new(GzDecoder::new(reader)),
            TarCompression::Bzip2 => Box::new(BzDecoder::new(reader)),
            TarCompression::Xz => Box::new(XzDecoder::new(reader)),
        };
        Self::unpack_entries(tar::Archive::new(reader), archive_path, dest_path)
    }

    fn unpack_entries<R: Read>(
        mut archive: tar::Archive<R>,
        archive_path: &Path,
        dest_path: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let mut extracted_files = Vec::new();

        let entries = archive
            .entries()
            .map_err(|e| Self::convert_read_error(e, archive_path))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| Self::convert_read_error(e, archive_path))?;

            let entry_path = entry
                .path()
                .map_err(|e| Self::convert_read_error(e, archive_path))?
                .into_owned();
            let is_file = entry.header().entry_type().is_file();

            // unpack_in refuses entries that would land outside dest_path
            let unpacked = entry
                .unpack_in(dest_path)
                .map_err(|e| Self::convert_read_error(e, archive_path))?;

            if !unpacked {
                warn!(entry = ?entry_path, "skipping entry with unsafe path");
                continue;
            }

            if is_file {
                extracted_files.push(dest_path.join(entry_path));
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "tar extraction successful"
        );

        Ok(extracted_files)
    }
}
