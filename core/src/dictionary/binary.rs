//! Fixed 110-byte dictionary records
//!
//! The proprietary engine dictionary is a flat file of fixed-width
//! records in the legacy codepages:
//!
//! ```text
//! [0]        hidden flag (0 = visible)
//! [1..32]    source text, Japanese codepage, NUL padded
//! [32..63]   target text, Korean codepage, NUL padded
//! [63..68]   part-of-speech code (ASCII)
//! [68..105]  attributes, Korean codepage, NUL padded
//! [105..110] reserved byte + record index
//! ```
//!
//! The same layout is written back out by the exporter, so the byte
//! limits here are the source of the entry-size invariants.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use nikkan_types::TermCategory;
use tracing::{info, warn};

use crate::codec::{CodePage, TextCodec};
use crate::error::FilterError;

use super::{DictReport, TermEntry, validate_entry};

pub const RECORD_LEN: usize = 110;
pub const SOURCE_BYTES: usize = 31;
pub const TARGET_BYTES: usize = 31;
pub const POS_BYTES: usize = 5;
pub const ATTR_BYTES: usize = 37;

/// Load every visible record from a binary dictionary file.
///
/// A missing file is non-fatal: an empty placeholder is created so later
/// runs (and the host engine) find the file in place, and loading
/// continues with the other sources. A short trailing record ends the
/// file silently.
pub(super) fn load_binary_file(
    path: &Path,
    codec: &dyn TextCodec,
    global_line: &mut usize,
    out: &mut Vec<TermEntry>,
    report: &mut DictReport,
) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(file = %file_name, "binary dictionary missing, creating empty placeholder");
            if let Err(e) = fs::write(path, []) {
                warn!(path = %path.display(), "placeholder create failed: {e}");
            }
            report.files_failed += 1;
            return;
        }
        Err(e) => {
            let err = FilterError::ConfigUnreadable {
                path: path.to_path_buf(),
                source: e,
            };
            warn!("binary dictionary load: {err}");
            report.files_failed += 1;
            return;
        }
    };

    let before = out.len();
    for (idx, record) in bytes.chunks_exact(RECORD_LEN).enumerate() {
        let local_line = idx + 1;
        let this_global = *global_line;
        *global_line += 1;

        if record[0] != 0 {
            report.hidden_skipped += 1;
            continue;
        }

        let mut offset = 1;
        let source_field = &record[offset..offset + SOURCE_BYTES];
        offset += SOURCE_BYTES;
        let target_field = &record[offset..offset + TARGET_BYTES];
        offset += TARGET_BYTES;
        let pos_field = &record[offset..offset + POS_BYTES];
        offset += POS_BYTES;
        let attr_field = &record[offset..offset + ATTR_BYTES];

        let pos_code = String::from_utf8_lossy(until_nul(pos_field)).to_string();
        let entry = TermEntry {
            source_text: codec.decode(until_nul(source_field), CodePage::Japanese),
            target_text: codec.decode(until_nul(target_field), CodePage::Korean),
            attributes: codec.decode(until_nul(attr_field), CodePage::Korean),
            category: TermCategory::from_pos_code(&pos_code),
            source_file: file_name.clone(),
            local_line,
            global_line: this_global,
        };

        match validate_entry(&entry, codec) {
            Ok(()) => {
                report.accepted += 1;
                out.push(entry);
            }
            Err(e) => {
                report.rejected += 1;
                warn!("binary dictionary entry rejected: {e}");
            }
        }
    }

    report.files_read += 1;
    info!(
        file = %file_name,
        entries = out.len() - before,
        "binary dictionary loaded"
    );
}

/// Serialize one entry into the fixed record layout. `index` lands in the
/// trailing field, matching the legacy writer.
pub(super) fn encode_record(entry: &TermEntry, index: u32, codec: &dyn TextCodec) -> [u8; RECORD_LEN] {
    let mut record = [0u8; RECORD_LEN];

    let mut offset = 1;
    copy_padded(
        &mut record[offset..offset + SOURCE_BYTES],
        &codec.encode(&entry.source_text, CodePage::Japanese),
    );
    offset += SOURCE_BYTES;
    copy_padded(
        &mut record[offset..offset + TARGET_BYTES],
        &codec.encode(&entry.target_text, CodePage::Korean),
    );
    offset += TARGET_BYTES;
    copy_padded(
        &mut record[offset..offset + POS_BYTES],
        entry.category.pos_code().as_bytes(),
    );
    offset += POS_BYTES;
    copy_padded(
        &mut record[offset..offset + ATTR_BYTES],
        &codec.encode(&entry.attributes, CodePage::Korean),
    );

    // [105] stays reserved zero, [106..110] is the record index
    record[RECORD_LEN - 4..].copy_from_slice(&index.to_le_bytes());
    record
}

/// C-string view of a NUL-padded field.
fn until_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

fn copy_padded(dest: &mut [u8], src: &[u8]) {
    let len = src.len().min(dest.len());
    dest[..len].copy_from_slice(&src[..len]);
}
