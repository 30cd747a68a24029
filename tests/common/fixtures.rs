//! Archive fixtures built in memory

use std::io::Write;

/// The two-file payload used by most scenarios
pub const RELEASE_FILES: &[(&str, &[u8])] = &[
    ("readme.txt", b"release notes"),
    ("bin/app", b"#!/bin/sh\necho app\n"),
];

/// Bytes of a zip archive containing the given files
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in files {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Bytes of a gzip-compressed tar archive containing the given files
pub fn tar_gz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

/// Bytes that no decoder accepts
pub const CORRUPT_BYTES: &[u8] = b"corrupted bytes, not an archive";
