//! Shared application context
//!
//! One [`FilterContext`] is constructed at startup and handed to every
//! consumer by `Arc`. It owns the configuration handle and both snapshot
//! stores, so the pipeline, the command dispatcher, and the reload
//! coordinator all operate on the same state without process globals.

use std::path::PathBuf;
use std::sync::Arc;

use nikkan_types::{Phase, ReloadCategory};
use tracing::info;

use crate::codec::{LegacyCodec, TextCodec};
use crate::config::ConfigHandle;
use crate::dictionary::{
    CompanionProbe, DictOptions, DictionaryStore, MergedDictionary, NoCompanion,
};
use crate::rules::{RulesetSnapshot, RulesetStore};

pub struct FilterContext {
    config: ConfigHandle,
    rules: RulesetStore,
    dictionary: DictionaryStore,
}

impl FilterContext {
    /// Context with the production collaborators: the legacy-codepage
    /// codec and no companion host.
    pub fn new(config: ConfigHandle) -> Self {
        Self::with_collaborators(config, Arc::new(LegacyCodec), Box::new(NoCompanion))
    }

    /// Context with injected collaborators, for tests and for hosts that
    /// carry a companion dictionary.
    pub fn with_collaborators(
        config: ConfigHandle,
        codec: Arc<dyn TextCodec>,
        probe: Box<dyn CompanionProbe>,
    ) -> Self {
        Self {
            config,
            rules: RulesetStore::new(),
            dictionary: DictionaryStore::new(codec, probe),
        }
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn rules(&self) -> &RulesetStore {
        &self.rules
    }

    pub fn dictionary(&self) -> &DictionaryStore {
        &self.dictionary
    }

    fn dict_dir(&self) -> PathBuf {
        PathBuf::from(self.config.snapshot().dict_directory)
    }

    /// Load everything: both rule phases, skip conditions, and the merged
    /// dictionary. Used at startup and by the reload command.
    pub fn reload_all(&self) -> (Arc<RulesetSnapshot>, Arc<MergedDictionary>) {
        let (snapshot, _) = self.rules.reload_all(&self.dict_dir());
        let dictionary = self.reload_dictionary();
        (snapshot, dictionary)
    }

    /// Rebuild the merged dictionary and hand the result to the backend
    /// via export.
    pub fn reload_dictionary(&self) -> Arc<MergedDictionary> {
        let config = self.config.snapshot();
        let options = DictOptions::from_config(&config);
        let (merged, _) = self.dictionary.reload(&options);
        self.export_dictionary();
        merged
    }

    /// Export the current merged dictionary for the backend. Returns the
    /// written path, or `None` when the user-dictionary switch is off or
    /// the write failed (the failure is logged by the exporter).
    pub fn export_dictionary(&self) -> Option<PathBuf> {
        let config = self.config.snapshot();
        if !config.user_dict {
            info!("user dictionary is off, export skipped");
            return None;
        }
        self.dictionary.export_current(&config.export_dir()).ok()
    }

    /// Remove exports left behind by previous runs.
    pub fn clean_stale_exports(&self) {
        crate::dictionary::clean_stale_exports(&self.config.snapshot().export_dir());
    }

    /// Rebuild the state belonging to one change category.
    pub fn reload_category(&self, category: ReloadCategory) {
        match category {
            ReloadCategory::PreFilter => {
                self.rules.reload_phase(&self.dict_dir(), Phase::Pre);
            }
            ReloadCategory::PostFilter => {
                self.rules.reload_phase(&self.dict_dir(), Phase::Post);
            }
            ReloadCategory::SkipLayer => {
                self.rules.reload_skip(&self.dict_dir());
            }
            ReloadCategory::UserDict => {
                self.reload_dictionary();
            }
            ReloadCategory::Config => self.config.reload_from_disk(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn context_in(dir: &std::path::Path) -> FilterContext {
        let handle = ConfigHandle::load_path(dir.join("nikkan.toml"));
        handle.update(|c| {
            c.dict_directory = dir.join("dict").to_string_lossy().to_string();
            c.export_directory = Some(dir.join("export").to_string_lossy().to_string());
        });
        fs::create_dir_all(dir.join("dict")).unwrap();
        fs::create_dir_all(dir.join("export")).unwrap();
        FilterContext::new(handle)
    }

    #[test]
    fn reload_all_populates_rules_and_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        fs::write(
            dir.path().join("dict/PreFilter_base.txt"),
            "abc\txyz\t0\t0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("dict/UserDict_base.txt"),
            "猫\t고양이\t0\n",
        )
        .unwrap();

        let (snapshot, dictionary) = ctx.reload_all();
        assert_eq!(snapshot.pre_rules.len(), 1);
        assert_eq!(dictionary.entries.len(), 1);
        assert_eq!(ctx.rules().current().generation, 1);
        assert_eq!(ctx.dictionary().current().generation, 1);
    }

    #[test]
    fn export_respects_the_user_dict_switch() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        fs::write(
            dir.path().join("dict/UserDict_base.txt"),
            "犬\t개\t0\n",
        )
        .unwrap();

        ctx.config().update(|c| c.user_dict = false);
        ctx.reload_dictionary();
        assert_eq!(fs::read_dir(dir.path().join("export")).unwrap().count(), 0);

        ctx.config().update(|c| c.user_dict = true);
        let path = ctx.export_dictionary().unwrap();
        assert!(path.exists());
        assert_eq!(fs::read_dir(dir.path().join("export")).unwrap().count(), 1);
    }

    #[test]
    fn category_reload_touches_only_its_store() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        fs::write(
            dir.path().join("dict/PostFilter_base.txt"),
            "foo\tbar\t0\t0\n",
        )
        .unwrap();
        ctx.reload_all();
        let dict_generation = ctx.dictionary().current().generation;

        ctx.reload_category(ReloadCategory::PostFilter);
        assert_eq!(ctx.rules().current().generation, 2);
        assert_eq!(ctx.rules().current().post_rules.len(), 1);
        assert_eq!(ctx.dictionary().current().generation, dict_generation);
    }
}
