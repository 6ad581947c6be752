//! Request pipeline around the translation backend
//!
//! One call runs pre-rewrite, backend translation, and post-rewrite in
//! order, logging the text at each stage so a session log reads as
//! request / pre / trans / post lines. Commands intercept before any
//! rewriting; empty input never reaches the backend.

use std::sync::Arc;

use nikkan_types::Phase;
use tracing::info;

use crate::commands;
use crate::context::FilterContext;
use crate::engine;
use crate::error::FilterError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The machine-translation engine being wrapped. Opaque to the filter
/// core; anything that turns Japanese text into Korean text fits.
pub trait TranslationBackend: Send + Sync {
    fn translate(&self, text: &str) -> Result<String, BoxError>;
}

pub struct TranslationPipeline {
    ctx: Arc<FilterContext>,
    backend: Box<dyn TranslationBackend>,
}

impl TranslationPipeline {
    pub fn new(ctx: Arc<FilterContext>, backend: Box<dyn TranslationBackend>) -> Self {
        Self { ctx, backend }
    }

    pub fn context(&self) -> &Arc<FilterContext> {
        &self.ctx
    }

    /// Run one request through the full pipeline.
    ///
    /// The ruleset snapshot and the switches are pinned once at entry, so
    /// a reload or a toggle landing mid-call cannot change this call's
    /// behavior between its pre and post phases.
    pub fn translate(&self, input: &str) -> Result<String, FilterError> {
        info!("[REQUEST] {input}");
        if input.is_empty() {
            return Ok(String::new());
        }
        if let Some(reply) = commands::dispatch(input, &self.ctx) {
            info!("[COMMAND] {reply}");
            return Ok(reply);
        }

        let switches = self.ctx.config().switches();
        if !switches.user_dict {
            info!("user dictionary is off");
        }
        let snapshot = self.ctx.rules().current();

        let pre = engine::rewrite(Phase::Pre, input, &snapshot, switches);
        info!("[PRE] {pre}");
        let translated = self
            .backend
            .translate(&pre)
            .map_err(FilterError::Backend)?;
        info!("[TRANS] {translated}");
        let post = engine::rewrite(Phase::Post, &translated, &snapshot, switches);
        info!("[POST] {post}");
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigHandle;
    use std::fs;

    struct MarkingBackend;

    impl TranslationBackend for MarkingBackend {
        fn translate(&self, text: &str) -> Result<String, BoxError> {
            Ok(format!("<{text}>"))
        }
    }

    struct FailingBackend;

    impl TranslationBackend for FailingBackend {
        fn translate(&self, _text: &str) -> Result<String, BoxError> {
            Err("engine offline".into())
        }
    }

    fn context_in(dir: &std::path::Path) -> Arc<FilterContext> {
        let handle = ConfigHandle::load_path(dir.join("nikkan.toml"));
        handle.update(|c| {
            c.dict_directory = dir.join("dict").to_string_lossy().to_string();
            c.export_directory = Some(dir.join("export").to_string_lossy().to_string());
        });
        fs::create_dir_all(dir.join("dict")).unwrap();
        fs::create_dir_all(dir.join("export")).unwrap();
        Arc::new(FilterContext::new(handle))
    }

    #[test]
    fn both_phases_wrap_the_backend() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        fs::write(
            dir.path().join("dict/PreFilter_base.txt"),
            "dog\tcat\t0\t0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("dict/PostFilter_base.txt"),
            "<cat>\tCAT\t0\t0\n",
        )
        .unwrap();
        ctx.reload_all();

        let pipeline = TranslationPipeline::new(ctx, Box::new(MarkingBackend));
        assert_eq!(pipeline.translate("dog").unwrap(), "CAT");
    }

    #[test]
    fn empty_input_never_reaches_the_backend() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        // A failing backend would turn any call into an error
        let pipeline = TranslationPipeline::new(ctx, Box::new(FailingBackend));

        assert_eq!(pipeline.translate("").unwrap(), "");
    }

    #[test]
    fn commands_intercept_before_translation() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        let pipeline = TranslationPipeline::new(ctx, Box::new(FailingBackend));

        // A failing backend proves the command never reached it
        let reply = pipeline.translate("/ver").unwrap();
        assert!(reply.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn backend_failure_surfaces_as_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        let pipeline = TranslationPipeline::new(ctx, Box::new(FailingBackend));

        match pipeline.translate("text") {
            Err(FilterError::Backend(e)) => assert_eq!(e.to_string(), "engine offline"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }
}
