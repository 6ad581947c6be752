pub mod codec;
pub mod commands;
pub mod config;
pub mod context;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod reload;
pub mod rules;
pub mod watch;

#[cfg(test)]
mod engine_tests;

// Re-exports for convenience
pub use config::{ConfigHandle, FilterConfig};
pub use context::FilterContext;
pub use error::FilterError;
pub use pipeline::{BoxError, TranslationBackend, TranslationPipeline};
pub use reload::ReloadCoordinator;
pub use watch::{ChangeEvent, watch_directory};
