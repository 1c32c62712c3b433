//! Archive extraction for release artifacts.
//!
//! Releases ship exactly one executable inside either a gzip-compressed
//! tarball or a zip archive. Only that one entry is needed, so tarballs are
//! not unpacked to disk: the decompressed stream is scanned header by header
//! by [`find_tar_entry`], a pure function over a byte buffer.
//!
//! # Tar layout
//!
//! A tarball is a sequence of 512-byte blocks. Each member starts with a
//! header block:
//!
//! | bytes     | field                                   |
//! |-----------|-----------------------------------------|
//! | 0..100    | name, NUL-terminated                    |
//! | 124..136  | size, octal ASCII, NUL/space padded     |
//!
//! followed by the member data, padded to a multiple of 512 bytes. Two
//! consecutive all-zero blocks mark the end of the archive.

use crate::constants::TAR_BLOCK_SIZE;
use crate::core::{BrunodoError, Result};
use crate::provision::release::ArchiveKind;
use crate::utils::fs::write_executable;
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const NAME_FIELD: std::ops::Range<usize> = 0..100;
const SIZE_FIELD: std::ops::Range<usize> = 124..136;

/// Failure of the raw tar scan, before it is tied to an archive path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TarScanError {
    /// The entry is not in the archive
    #[error("entry not found")]
    NotFound,
    /// A header's size field is not octal ASCII
    #[error("malformed size field in header at offset {offset}")]
    MalformedSize {
        /// Offset of the offending header
        offset: usize,
    },
    /// The matching entry's data runs past the end of the buffer
    #[error("truncated entry data for header at offset {offset}")]
    Truncated {
        /// Offset of the offending header
        offset: usize,
    },
}

/// Scans an uncompressed tar buffer for `name` and returns its data.
///
/// # Errors
///
/// - [`TarScanError::NotFound`] at the end marker or the end of the buffer,
///   including when a non-matching member's data runs past it
/// - [`TarScanError::MalformedSize`] for a size field that is not octal
/// - [`TarScanError::Truncated`] when the matching entry's data extends beyond the buffer
pub fn find_tar_entry<'a>(buf: &'a [u8], name: &str) -> std::result::Result<&'a [u8], TarScanError> {
    let mut offset = 0usize;

    while offset + TAR_BLOCK_SIZE <= buf.len() {
        let header = &buf[offset..offset + TAR_BLOCK_SIZE];

        if is_zero_block(header) {
            let next = offset + TAR_BLOCK_SIZE;
            if next + TAR_BLOCK_SIZE <= buf.len() && is_zero_block(&buf[next..next + TAR_BLOCK_SIZE]) {
                break;
            }
            // lone zero block
            offset = next;
            continue;
        }

        let size = parse_octal(&header[SIZE_FIELD]).ok_or(TarScanError::MalformedSize { offset })?;
        let size = usize::try_from(size).map_err(|_| TarScanError::MalformedSize { offset })?;

        let data_start = offset + TAR_BLOCK_SIZE;
        let data_end = data_start.checked_add(size).filter(|&end| end <= buf.len());

        if header_name(header) == name.as_bytes() {
            let data_end = data_end.ok_or(TarScanError::Truncated { offset })?;
            return Ok(&buf[data_start..data_end]);
        }

        if data_end.is_none() {
            // nothing can follow a member that runs off the end
            break;
        }
        offset = data_start + size.div_ceil(TAR_BLOCK_SIZE) * TAR_BLOCK_SIZE;
    }

    Err(TarScanError::NotFound)
}

fn header_name(header: &[u8]) -> &[u8] {
    let field = &header[NAME_FIELD];
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Parses a NUL/space padded octal ASCII field.
fn parse_octal(field: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(field).ok()?;
    let digits = text.trim_matches(|c: char| c == '\0' || c == ' ');
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 8).ok()
}

/// Decompresses a gzip buffer fully in memory.
pub fn gunzip(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Extracts `inner_name` from an in-memory archive.
///
/// `archive_label` names the archive in errors.
pub fn extract_from_bytes(
    bytes: &[u8],
    kind: ArchiveKind,
    inner_name: &str,
    archive_label: &str,
) -> Result<Vec<u8>> {
    match kind {
        ArchiveKind::TarGz => {
            let tar = gunzip(bytes).map_err(|e| BrunodoError::UnpackFailed {
                archive: archive_label.to_string(),
                reason: format!("gzip: {e}"),
            })?;
            match find_tar_entry(&tar, inner_name) {
                Ok(data) => Ok(data.to_vec()),
                Err(TarScanError::NotFound) => Err(BrunodoError::EntryNotFound {
                    archive: archive_label.to_string(),
                    entry: inner_name.to_string(),
                }),
                Err(e) => Err(BrunodoError::UnpackFailed {
                    archive: archive_label.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        ArchiveKind::Zip => extract_zip_entry(bytes, inner_name, archive_label),
    }
}

fn extract_zip_entry(bytes: &[u8], inner_name: &str, archive_label: &str) -> Result<Vec<u8>> {
    let unpack_failed = |reason: String| BrunodoError::UnpackFailed {
        archive: archive_label.to_string(),
        reason,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| unpack_failed(format!("zip: {e}")))?;

    let mut entry = match archive.by_name(inner_name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(BrunodoError::EntryNotFound {
                archive: archive_label.to_string(),
                entry: inner_name.to_string(),
            });
        }
        Err(e) => return Err(unpack_failed(format!("zip: {e}"))),
    };

    let mut out = Vec::new();
    entry.read_to_end(&mut out).map_err(|e| unpack_failed(format!("zip entry: {e}")))?;
    Ok(out)
}

/// Reads `archive_path` and returns the bytes of `inner_name`.
///
/// Decompression and scanning run on the blocking pool.
pub async fn extract_binary(archive_path: &Path, kind: ArchiveKind, inner_name: &str) -> Result<Vec<u8>> {
    let bytes = tokio::fs::read(archive_path)
        .await
        .map_err(|e| BrunodoError::io("read archive", archive_path, &e))?;

    let label = archive_path.display().to_string();
    let inner = inner_name.to_string();
    debug!("Extracting '{}' from {} ({} bytes)", inner, label, bytes.len());

    let join_label = label.clone();
    tokio::task::spawn_blocking(move || extract_from_bytes(&bytes, kind, &inner, &label))
        .await
        .map_err(|e| BrunodoError::UnpackFailed {
            archive: join_label,
            reason: format!("extraction task failed: {e}"),
        })?
}

/// Extracts `inner_name` from the archive and writes it to `dest` as an
/// executable (`0o755` on Unix).
pub async fn install_binary(
    archive_path: &Path,
    kind: ArchiveKind,
    inner_name: &str,
    dest: &Path,
) -> Result<()> {
    let payload = extract_binary(archive_path, kind, inner_name).await?;

    let dest_owned = dest.to_path_buf();
    tokio::task::spawn_blocking(move || write_executable(&dest_owned, &payload))
        .await
        .map_err(|e| BrunodoError::WriteFailed {
            path: dest.display().to_string(),
            cause: e.to_string(),
        })??;

    debug!("Installed executable at {}", dest.display());
    Ok(())
}
