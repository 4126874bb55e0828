use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::BadgeError;

/// Largest uncompressed entry accepted from an archive (64 MiB).
pub const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Read every file entry of a ZIP archive into memory, keyed by entry name.
///
/// Directory entries are skipped. Entries come back sorted by name. The sizes
/// recorded in entry headers are not trusted: each entry is read through a
/// [`MAX_ENTRY_SIZE`] limit and a larger one is an archive error. When a name
/// appears more than once only the last entry is kept, and a warning is logged.
pub fn extract_archive(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, BadgeError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| BadgeError::Archive(e.to_string()))?;

    // The reader keeps one entry per name, so duplicates are found in the raw directory
    for name in duplicate_entry_names(bytes, archive.central_directory_start()) {
        tracing::warn!(entry = %name, "duplicate archive entry, keeping the last one");
    }

    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| BadgeError::Archive(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let data = read_limited(&mut entry, &name, MAX_ENTRY_SIZE)?;
        entries.insert(name, data);
    }

    tracing::debug!(entries = entries.len(), "extracted archive");
    Ok(entries)
}

/// Read at most `limit` bytes; anything longer is an archive error.
fn read_limited<R: Read>(reader: R, name: &str, limit: u64) -> Result<Vec<u8>, BadgeError> {
    let mut data = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut data)
        .map_err(|e| BadgeError::Archive(format!("failed to read entry {}: {}", name, e)))?;

    if data.len() as u64 > limit {
        return Err(BadgeError::Archive(format!(
            "entry {} exceeds the {} byte limit",
            name, limit
        )));
    }
    Ok(data)
}

const CENTRAL_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];
const CENTRAL_HEADER_LEN: usize = 46;

/// Names that occur in more than one central directory record.
///
/// Walks the records starting at `start` and stops at the first one that is
/// truncated or has the wrong signature.
fn duplicate_entry_names(bytes: &[u8], start: u64) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut pos = match usize::try_from(start) {
        Ok(pos) => pos,
        Err(_) => return Vec::new(),
    };

    while let Some(header) = bytes.get(pos..pos + CENTRAL_HEADER_LEN) {
        if header[..4] != CENTRAL_HEADER_SIGNATURE {
            break;
        }
        let field = |at: usize| u16::from_le_bytes([header[at], header[at + 1]]) as usize;
        let (name_len, extra_len, comment_len) = (field(28), field(30), field(32));

        let name_start = pos + CENTRAL_HEADER_LEN;
        let Some(name) = bytes.get(name_start..name_start + name_len) else {
            break;
        };
        *counts.entry(String::from_utf8_lossy(name).into_owned()).or_default() += 1;

        pos = name_start + name_len + extra_len + comment_len;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect()
}

/// Pack `(filename, bytes)` pairs into a deflate-compressed ZIP archive.
pub fn build_archive(files: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>, BadgeError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in files {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| BadgeError::Archive(format!("failed to add {}: {}", name, e)))?;
        writer
            .write_all(data)
            .map_err(|e| BadgeError::Archive(format!("failed to write {}: {}", name, e)))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| BadgeError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}
