//! Error taxonomy for the filter core
//!
//! Nothing here is fatal to the host: the loaders build these for their
//! warn lines and keep going past bad files and bad lines, so only the
//! export and pipeline entry points actually return them.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    /// A configuration or data file could not be read; its contribution
    /// to the load is empty.
    #[error("unreadable file {path:?}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A rule or skip-condition pattern failed to compile and was
    /// discarded.
    #[error("pattern failed to compile at {file}:{line}: {source}")]
    PatternCompile {
        file: String,
        line: usize,
        source: regex::Error,
    },

    /// A dictionary entry exceeded the fixed-record byte limits and was
    /// rejected.
    #[error("dictionary entry too large at {file}:{line} ({field} is {len} bytes, limit {limit})")]
    EntryTooLarge {
        file: String,
        line: usize,
        field: &'static str,
        len: usize,
        limit: usize,
    },

    /// The merged dictionary could not be written out; the backend will
    /// not see the merged terms this run.
    #[error("dictionary export to {path:?} failed: {source}")]
    ExportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The translation backend reported a failure.
    #[error("translation backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}
