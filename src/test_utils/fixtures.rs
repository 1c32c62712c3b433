//! In-memory release fixtures.
//!
//! These panic on failure: they only ever run inside tests.

use flate2::Compression;
use flate2::write::GzEncoder;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Write};

/// Builds a gzip-compressed tarball holding `entries` (name, content).
pub fn tar_gz_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        builder.append_data(&mut header, name, *data).expect("append tar entry");
    }

    builder
        .into_inner()
        .expect("finish tar archive")
        .finish()
        .expect("finish gzip stream")
}

/// Builds a zip archive holding `entries` (name, content).
pub fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for (name, data) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }

    writer.finish().expect("finish zip archive").into_inner()
}

/// Lowercase hex MD5 of `data`, as published in `.md5` sidecars.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A tiny shell script standing in for the nonodo executable.
///
/// It prints its arguments to the file named by `$BRUNODO_FAKE_ARGS_FILE`
/// (when set) and exits with `$BRUNODO_FAKE_EXIT` (default 0).
pub fn fake_nonodo_script() -> Vec<u8> {
    b"#!/bin/sh\n\
      if [ -n \"$BRUNODO_FAKE_ARGS_FILE\" ]; then printf '%s\\n' \"$@\" > \"$BRUNODO_FAKE_ARGS_FILE\"; fi\n\
      exit \"${BRUNODO_FAKE_EXIT:-0}\"\n"
        .to_vec()
}
