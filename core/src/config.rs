//! Persistent filter configuration
//!
//! Stored as TOML through `confy` under the `nikkan` app name. Runtime
//! commands flip switches and persist them immediately; the watcher can
//! also pick up hand edits to the file and trigger a reload, so reads go
//! through a shared handle rather than a startup-time copy.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use nikkan_types::FilterSwitches;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Everything the filter core reads from disk-backed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Directory scanned for `PreFilter*` / `PostFilter*` / `SkipLayer*`
    /// / `UserDict*` files.
    pub dict_directory: String,
    /// Where merged-dictionary exports land. Defaults to the OS temp dir.
    pub export_directory: Option<String>,
    /// Path of the proprietary binary dictionary, if one exists.
    pub engine_dict_path: Option<String>,
    /// Include the binary dictionary as a merge source.
    pub engine_dict: bool,
    /// Run the pre-translation rewrite phase.
    pub pre_filter: bool,
    /// Run the post-translation rewrite phase.
    pub post_filter: bool,
    /// Export the merged dictionary for the backend to pick up.
    pub user_dict: bool,
    /// Recognize the gated runtime commands.
    pub commands: bool,
    /// React to file change events with reloads.
    pub watch: bool,
    /// Log every text-changing rule application.
    pub log_rewrites: bool,
}

impl ::std::default::Default for FilterConfig {
    fn default() -> Self {
        Self {
            dict_directory: "dict".to_string(),
            export_directory: None,
            engine_dict_path: None,
            engine_dict: true,
            pre_filter: true,
            post_filter: true,
            user_dict: true,
            commands: true,
            watch: true,
            log_rewrites: false,
        }
    }
}

impl FilterConfig {
    /// The runtime switches as one copyable bundle, taken at the start of
    /// an operation so a concurrent toggle cannot flip mid-call.
    pub fn switches(&self) -> FilterSwitches {
        FilterSwitches {
            pre_filter: self.pre_filter,
            post_filter: self.post_filter,
            user_dict: self.user_dict,
            log_rewrites: self.log_rewrites,
        }
    }

    /// Export directory with the temp-dir fallback applied.
    pub fn export_dir(&self) -> PathBuf {
        self.export_directory
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Shared, persistable view of [`FilterConfig`].
///
/// Holds the backing file path so toggles can write straight back and so
/// the reload coordinator can recognize edits to the file by name.
pub struct ConfigHandle {
    inner: RwLock<FilterConfig>,
    path: Option<PathBuf>,
}

impl ConfigHandle {
    /// Load from the per-user config location (`confy`), falling back to
    /// defaults when the file is missing or unreadable.
    pub fn load_default() -> Self {
        let config = confy::load("nikkan", None).unwrap_or_else(|e| {
            warn!("config unreadable, using defaults: {e}");
            FilterConfig::default()
        });
        let path = confy::get_configuration_file_path("nikkan", None).ok();
        Self {
            inner: RwLock::new(config),
            path,
        }
    }

    /// Load from an explicit file path. Used by tests and by deployments
    /// that keep the config next to the dictionary files.
    pub fn load_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = confy::load_path(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), "config unreadable, using defaults: {e}");
            FilterConfig::default()
        });
        Self {
            inner: RwLock::new(config),
            path: Some(path),
        }
    }

    /// Current configuration by value.
    pub fn snapshot(&self) -> FilterConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current runtime switches by value.
    pub fn switches(&self) -> FilterSwitches {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .switches()
    }

    /// File name of the backing config file, for change classification.
    pub fn file_name(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }

    /// Apply an in-memory update and persist the result.
    ///
    /// Persistence failure is logged and otherwise ignored; the in-memory
    /// state keeps the new value either way.
    pub fn update(&self, apply: impl FnOnce(&mut FilterConfig)) {
        let updated = {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            apply(&mut guard);
            guard.clone()
        };
        self.persist(&updated);
    }

    /// Re-read the backing file, replacing the in-memory state. Used when
    /// the watcher sees the config file change.
    pub fn reload_from_disk(&self) {
        let Some(path) = self.path.as_ref() else {
            return;
        };
        match confy::load_path::<FilterConfig>(path) {
            Ok(config) => {
                *self.inner.write().unwrap_or_else(PoisonError::into_inner) = config;
            }
            Err(e) => {
                warn!(path = %path.display(), "config reload failed, keeping current: {e}");
            }
        }
    }

    fn persist(&self, config: &FilterConfig) {
        let result = match self.path.as_ref() {
            Some(path) => confy::store_path(path, config),
            None => confy::store("nikkan", None, config),
        };
        if let Err(e) = result {
            warn!("config save failed: {e}");
        }
    }

    /// Path of the backing file, if one is known.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
