//! Merged dictionary export
//!
//! The merged, visible entries are written back out in the fixed record
//! layout for the translation backend. Each process exports under its
//! own session tag so concurrent host instances never clobber each
//! other's file; leftovers from dead runs are swept at startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use rand::Rng;
use tracing::{info, warn};

use crate::codec::TextCodec;
use crate::error::FilterError;

use super::TermEntry;
use super::binary::{RECORD_LEN, encode_record};

pub const EXPORT_EXTENSION: &str = "nkd";

/// Session-unique tag used in export filenames: start-of-use wall clock
/// millis perturbed by a random offset, fixed for the process lifetime.
fn session_tag() -> u64 {
    static TAG: OnceLock<u64> = OnceLock::new();
    *TAG.get_or_init(|| {
        let millis = chrono::Utc::now().timestamp_millis() as u64;
        millis.wrapping_add(rand::thread_rng().gen_range(0..0x8000))
    })
}

/// This process's export path under `dir`.
pub fn export_path(dir: &Path) -> PathBuf {
    dir.join(format!("UserDict_{}.{}", session_tag(), EXPORT_EXTENSION))
}

/// Write `entries` as fixed records to this session's export file.
///
/// Entries with an empty source text carry nothing the backend can match
/// and are skipped. Failure is reported, not fatal: the backend simply
/// will not see the merged terms this run.
pub fn export_dictionary(
    entries: &[TermEntry],
    dir: &Path,
    codec: &dyn TextCodec,
) -> Result<PathBuf, FilterError> {
    let start = Instant::now();
    let path = export_path(dir);

    let mut buffer = Vec::with_capacity(entries.len() * RECORD_LEN);
    let mut written = 0u32;
    for entry in entries {
        if entry.source_text.is_empty() {
            continue;
        }
        buffer.extend_from_slice(&encode_record(entry, written, codec));
        written += 1;
    }

    fs::write(&path, &buffer).map_err(|e| {
        warn!(path = %path.display(), "dictionary export failed: {e}");
        FilterError::ExportWrite {
            path: path.clone(),
            source: e,
        }
    })?;

    info!(
        path = %path.display(),
        entries = written,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "dictionary exported"
    );
    Ok(path)
}

/// Remove exports left behind by previous runs.
///
/// Runs at startup, before this session's first export exists, so the
/// blanket name match cannot eat our own file.
pub fn clean_stale_exports(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let suffix = format!(".{EXPORT_EXTENSION}");
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !(name.starts_with("userdict") && name.ends_with(&suffix)) {
            continue;
        }
        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "removed stale dictionary export"),
            Err(e) => warn!(path = %path.display(), "stale export not removed: {e}"),
        }
    }
}
