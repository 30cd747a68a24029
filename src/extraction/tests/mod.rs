use crate::error::ExtractionError;
use crate::extraction::shared::sanitize_entry_path;
use crate::extraction::tar::TarCompression;
use crate::extraction::*;
use crate::types::ArchiveKind;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a valid ZIP archive containing the given files
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Build an in-memory tar stream containing the given files
fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ::tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = ::tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap()
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder =
        ::flate2::write::GzEncoder::new(Vec::new(), ::flate2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn bzip2(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ::bzip2::write::BzEncoder::new(Vec::new(), ::bzip2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn xz(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ::xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Temp dir with an existing, empty `out` destination
fn workspace() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("out");
    std::fs::create_dir(&dest).unwrap();
    (temp, dest)
}

const SAMPLE_FILES: &[(&str, &[u8])] = &[
    ("readme.txt", b"hello from the archive"),
    ("bin/app", b"#!/bin/sh\necho app\n"),
];

fn assert_sample_extracted(dest: &Path) {
    assert_eq!(
        std::fs::read(dest.join("readme.txt")).unwrap(),
        b"hello from the archive"
    );
    assert_eq!(
        std::fs::read(dest.join("bin/app")).unwrap(),
        b"#!/bin/sh\necho app\n"
    );
}

// ---------------------------------------------------------------------------
// ZIP
// ---------------------------------------------------------------------------

#[test]
fn zip_extracts_all_entries_with_relative_paths() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("release.zip");
    create_zip_archive(&archive, SAMPLE_FILES);

    let files = decode(ArchiveKind::Zip, &archive, &dest).unwrap();

    assert_eq!(files.len(), 2);
    assert!(files.contains(&dest.join("bin/app")));
    assert_sample_extracted(&dest);
}

#[test]
fn zip_with_garbage_content_is_corrupt() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("broken.zip");
    std::fs::write(&archive, b"this is definitely not a zip archive").unwrap();

    let err = decode(ArchiveKind::Zip, &archive, &dest).unwrap_err();

    assert!(
        matches!(err, ExtractionError::CorruptArchive { .. }),
        "expected CorruptArchive, got {err:?}"
    );
}

#[test]
fn zip_entries_escaping_target_are_skipped() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("evil.zip");
    create_zip_archive(&archive, &[("../escaped.txt", b"nope"), ("ok.txt", b"fine")]);

    let files = decode(ArchiveKind::Zip, &archive, &dest).unwrap();

    assert_eq!(files, vec![dest.join("ok.txt")]);
    assert!(!temp.path().join("escaped.txt").exists());
}

#[test]
fn zip_into_missing_destination_is_io_error() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("release.zip");
    create_zip_archive(&archive, &[("top.txt", b"x")]);

    let err = decode(ArchiveKind::Zip, &archive, &temp.path().join("absent")).unwrap_err();

    assert!(matches!(err, ExtractionError::Io { .. }), "got {err:?}");
}

#[test]
fn missing_archive_is_io_error() {
    let (temp, dest) = workspace();
    let err = decode(ArchiveKind::Zip, &temp.path().join("gone.zip"), &dest).unwrap_err();
    assert!(matches!(err, ExtractionError::Io { .. }));
}

// ---------------------------------------------------------------------------
// tar / tar.gz
// ---------------------------------------------------------------------------

#[test]
fn tar_extracts_all_entries() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("release.tar");
    std::fs::write(&archive, tar_bytes(SAMPLE_FILES)).unwrap();

    let files = decode(ArchiveKind::Tar, &archive, &dest).unwrap();

    assert_eq!(files.len(), 2);
    assert_sample_extracted(&dest);
}

#[test]
fn tar_gz_extracts_all_entries() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("release.tar.gz");
    std::fs::write(&archive, gzip(&tar_bytes(SAMPLE_FILES))).unwrap();

    decode(ArchiveKind::TarGz, &archive, &dest).unwrap();

    assert_sample_extracted(&dest);
}

#[test]
fn tar_compression_is_detected_from_content_not_extension() {
    let (temp, dest) = workspace();

    // gzip data behind a plain .tar name
    let disguised = temp.path().join("disguised.tar");
    std::fs::write(&disguised, gzip(&tar_bytes(&[("a.txt", b"gz")]))).unwrap();
    decode(ArchiveKind::Tar, &disguised, &dest).unwrap();
    assert_eq!(std::fs::read(dest.join("a.txt")).unwrap(), b"gz");

    // plain tar behind a .tgz name
    let plain = temp.path().join("plain.tgz");
    std::fs::write(&plain, tar_bytes(&[("b.txt", b"plain")])).unwrap();
    decode(ArchiveKind::TarGz, &plain, &dest).unwrap();
    assert_eq!(std::fs::read(dest.join("b.txt")).unwrap(), b"plain");
}

#[test]
fn detect_compression_reads_magic_and_rewinds() {
    let mut gz = Cursor::new(gzip(b"payload"));
    assert_eq!(
        TarExtractor::detect_compression(&mut gz).unwrap(),
        TarCompression::Gzip
    );
    assert_eq!(gz.position(), 0);

    let mut plain = Cursor::new(tar_bytes(&[("x", b"y")]));
    assert_eq!(
        TarExtractor::detect_compression(&mut plain).unwrap(),
        TarCompression::None
    );

    let mut tiny = Cursor::new(vec![0x1F]);
    assert_eq!(
        TarExtractor::detect_compression(&mut tiny).unwrap(),
        TarCompression::None
    );
}

#[test]
fn bzip2_and_xz_tar_streams_are_detected_and_extracted() {
    let (temp, dest) = workspace();

    let bz = temp.path().join("release-bz.tar");
    std::fs::write(&bz, bzip2(&tar_bytes(&[("bz.txt", b"bzip2 payload")]))).unwrap();
    decode(ArchiveKind::Tar, &bz, &dest).unwrap();
    assert_eq!(std::fs::read(dest.join("bz.txt")).unwrap(), b"bzip2 payload");

    let xz_archive = temp.path().join("release-xz.tar");
    std::fs::write(&xz_archive, xz(&tar_bytes(SAMPLE_FILES))).unwrap();
    let files = decode(ArchiveKind::Tar, &xz_archive, &dest).unwrap();
    assert_eq!(files.len(), 2);
    assert_sample_extracted(&dest);
}

#[test]
fn detect_compression_recognizes_bzip2_and_xz_magic() {
    let mut bz = Cursor::new(bzip2(b"payload"));
    assert_eq!(
        TarExtractor::detect_compression(&mut bz).unwrap(),
        TarCompression::Bzip2
    );
    assert_eq!(bz.position(), 0);

    let mut xz_stream = Cursor::new(xz(b"payload"));
    assert_eq!(
        TarExtractor::detect_compression(&mut xz_stream).unwrap(),
        TarCompression::Xz
    );
}

#[test]
fn invalid_xz_stream_is_corrupt() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("broken.tar");
    let mut bytes = vec![0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
    bytes.extend_from_slice(&[0xAB; 64]);
    std::fs::write(&archive, bytes).unwrap();

    let err = decode(ArchiveKind::Tar, &archive, &dest).unwrap_err();

    assert!(
        matches!(err, ExtractionError::CorruptArchive { .. }),
        "expected CorruptArchive, got {err:?}"
    );
}

#[test]
fn invalid_gzip_stream_is_corrupt() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("broken.tar.gz");
    // Valid gzip member header followed by a deflate block with a reserved block type
    let mut bytes = vec![0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF];
    bytes.extend_from_slice(&[0xFF; 64]);
    std::fs::write(&archive, bytes).unwrap();

    let err = decode(ArchiveKind::TarGz, &archive, &dest).unwrap_err();

    assert!(
        matches!(err, ExtractionError::CorruptArchive { .. }),
        "expected CorruptArchive, got {err:?}"
    );
}

#[test]
fn garbage_tar_is_corrupt() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("noise.tar");
    std::fs::write(&archive, vec![0xAB; 1024]).unwrap();

    let err = decode(ArchiveKind::Tar, &archive, &dest).unwrap_err();

    assert!(matches!(err, ExtractionError::CorruptArchive { .. }), "got {err:?}");
}

#[test]
fn empty_tar_is_corrupt() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("empty.tar");
    std::fs::write(&archive, b"").unwrap();

    let err = decode(ArchiveKind::Tar, &archive, &dest).unwrap_err();

    assert!(err.to_string().contains("empty archive"));
}

// ---------------------------------------------------------------------------
// RAR and dispatch
// ---------------------------------------------------------------------------

#[test]
fn invalid_rar_fails_without_panicking() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("broken.rar");
    std::fs::write(&archive, b"Rar! but not really").unwrap();

    let err = decode(ArchiveKind::Rar, &archive, &dest).unwrap_err();

    #[cfg(feature = "rar")]
    assert!(
        matches!(
            err,
            ExtractionError::CorruptArchive { .. } | ExtractionError::UnsupportedFormat { .. }
        ),
        "got {err:?}"
    );
    #[cfg(not(feature = "rar"))]
    assert!(matches!(err, ExtractionError::UnsupportedFormat { .. }));
}

#[test]
fn unsupported_kind_is_a_no_op() {
    let (temp, dest) = workspace();
    let file = temp.path().join("notes.txt");
    std::fs::write(&file, b"text").unwrap();

    let files = decode(ArchiveKind::Unsupported, &file, &dest).unwrap();

    assert!(files.is_empty());
    assert_eq!(std::fs::read_dir(&dest).unwrap().count(), 0);
}

#[tokio::test]
async fn decode_blocking_runs_extraction_off_the_runtime() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("release.zip");
    create_zip_archive(&archive, SAMPLE_FILES);

    let files = decode_blocking(ArchiveKind::Zip, &archive, &dest)
        .await
        .unwrap();

    assert_eq!(files.len(), 2);
    assert_sample_extracted(&dest);
}

#[tokio::test]
async fn decode_blocking_propagates_decode_errors() {
    let (temp, dest) = workspace();
    let archive = temp.path().join("broken.zip");
    std::fs::write(&archive, b"garbage").unwrap();

    let err = decode_blocking(ArchiveKind::Zip, &archive, &dest)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "corrupt_archive");
}

#[test]
fn sanitize_entry_path_keeps_only_normal_components() {
    assert_eq!(
        sanitize_entry_path(Path::new("../../etc/passwd")),
        Some(PathBuf::from("etc/passwd"))
    );
    assert_eq!(
        sanitize_entry_path(Path::new("/abs/file.txt")),
        Some(PathBuf::from("abs/file.txt"))
    );
    assert_eq!(sanitize_entry_path(Path::new("..")), None);
    assert_eq!(sanitize_entry_path(Path::new("./")), None);
}
