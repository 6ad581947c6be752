//! Multi-source dictionary merge
//!
//! Three sources feed the merged dictionary, in fixed precedence order:
//! the proprietary binary dictionary (when configured), a companion
//! application's dictionary file (when the companion host is detected),
//! and every `UserDict*.txt` in the dictionary directory. Entries are
//! validated against the fixed-record byte limits on the way in and kept
//! in load order; the merged result is published as an immutable
//! generation just like the ruleset, and exported back out in record
//! form for the backend.

mod binary;
mod export;
mod text;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Instant;

use nikkan_types::TermCategory;
use tracing::{debug, info};

use crate::codec::{CodePage, TextCodec};
use crate::config::FilterConfig;
use crate::error::FilterError;

pub use binary::{ATTR_BYTES, RECORD_LEN, SOURCE_BYTES, TARGET_BYTES};
pub use export::{EXPORT_EXTENSION, clean_stale_exports, export_dictionary, export_path};

/// One merged dictionary term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermEntry {
    /// Japanese side. At most [`SOURCE_BYTES`] in its legacy encoding.
    pub source_text: String,
    /// Korean side. At most [`TARGET_BYTES`] in its legacy encoding.
    pub target_text: String,
    /// Opaque attribute string. At most [`ATTR_BYTES`] encoded.
    pub attributes: String,
    pub category: TermCategory,
    pub source_file: String,
    pub local_line: usize,
    pub global_line: usize,
}

/// One immutable generation of the merged dictionary.
#[derive(Debug, Default)]
pub struct MergedDictionary {
    pub generation: u64,
    /// All accepted entries, concatenated in source precedence order.
    pub entries: Vec<TermEntry>,
}

/// Counters reported by one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DictReport {
    pub files_read: usize,
    pub files_failed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub hidden_skipped: usize,
}

/// Which sources a merge draws from, resolved from configuration.
#[derive(Debug, Clone)]
pub struct DictOptions {
    pub directory: PathBuf,
    /// Path of the proprietary binary dictionary, when that source is
    /// enabled and configured.
    pub binary_dict: Option<PathBuf>,
}

impl DictOptions {
    pub fn from_config(config: &FilterConfig) -> Self {
        let binary_dict = if config.engine_dict {
            config.engine_dict_path.as_ref().map(PathBuf::from)
        } else {
            None
        };
        Self {
            directory: PathBuf::from(&config.dict_directory),
            binary_dict,
        }
    }
}

/// Detection of the companion host application.
///
/// Some deployments run inside a launcher that ships its own dictionary
/// file; that file only applies when the launcher is actually the host
/// process. The probe answers with the file to merge, or `None` when no
/// companion is present. It is consulted once and the answer cached for
/// the store's lifetime.
pub trait CompanionProbe: Send + Sync {
    fn companion_dict(&self) -> Option<PathBuf>;
}

/// Standalone operation: no companion host, no extra dictionary.
pub struct NoCompanion;

impl CompanionProbe for NoCompanion {
    fn companion_dict(&self) -> Option<PathBuf> {
        None
    }
}

/// Check an entry against the fixed-record byte limits.
pub(crate) fn validate_entry(entry: &TermEntry, codec: &dyn TextCodec) -> Result<(), FilterError> {
    let checks = [
        ("source", &entry.source_text, CodePage::Japanese, SOURCE_BYTES),
        ("target", &entry.target_text, CodePage::Korean, TARGET_BYTES),
        ("attributes", &entry.attributes, CodePage::Korean, ATTR_BYTES),
    ];
    for (field, value, page, limit) in checks {
        let len = codec.encoded_len(value, page);
        if len > limit {
            return Err(FilterError::EntryTooLarge {
                file: entry.source_file.clone(),
                line: entry.local_line,
                field,
                len,
                limit,
            });
        }
    }
    Ok(())
}

/// Holds the current [`MergedDictionary`] and serializes merges, the same
/// publish-by-swap scheme as the ruleset store.
pub struct DictionaryStore {
    current: RwLock<Arc<MergedDictionary>>,
    reload_lock: Mutex<()>,
    codec: Arc<dyn TextCodec>,
    probe: Box<dyn CompanionProbe>,
    companion: OnceLock<Option<PathBuf>>,
}

impl DictionaryStore {
    pub fn new(codec: Arc<dyn TextCodec>, probe: Box<dyn CompanionProbe>) -> Self {
        Self {
            current: RwLock::new(Arc::new(MergedDictionary::default())),
            reload_lock: Mutex::new(()),
            codec,
            probe,
            companion: OnceLock::new(),
        }
    }

    pub fn current(&self) -> Arc<MergedDictionary> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn codec(&self) -> &dyn TextCodec {
        self.codec.as_ref()
    }

    /// Rebuild the merged dictionary from all configured sources and
    /// publish it as the next generation.
    pub fn reload(&self, options: &DictOptions) -> (Arc<MergedDictionary>, DictReport) {
        let _reload = self
            .reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let start = Instant::now();

        let mut entries = Vec::new();
        let mut report = DictReport::default();
        let mut global_line = 1usize;

        if let Some(path) = &options.binary_dict {
            binary::load_binary_file(
                path,
                self.codec.as_ref(),
                &mut global_line,
                &mut entries,
                &mut report,
            );
        }

        match self.companion.get_or_init(|| self.probe.companion_dict()) {
            Some(path) => text::load_text_file(
                path,
                self.codec.as_ref(),
                &mut global_line,
                &mut entries,
                &mut report,
            ),
            None => debug!("no companion dictionary"),
        }

        text::load_text_files(
            &options.directory,
            self.codec.as_ref(),
            &mut global_line,
            &mut entries,
            &mut report,
        );

        let base = self.current();
        let next = Arc::new(MergedDictionary {
            generation: base.generation + 1,
            entries,
        });
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);

        info!(
            total = next.entries.len(),
            rejected = report.rejected,
            hidden = report.hidden_skipped,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "user dictionary merged"
        );
        (next, report)
    }

    /// Export the current generation to `dir` for the backend.
    pub fn export_current(&self, dir: &Path) -> Result<PathBuf, FilterError> {
        let snapshot = self.current();
        export_dictionary(&snapshot.entries, dir, self.codec.as_ref())
    }
}
