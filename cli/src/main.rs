use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use nikkan_core::{
    BoxError, ConfigHandle, FilterContext, ReloadCoordinator, TranslationBackend,
    TranslationPipeline, watch_directory,
};
use tracing_subscriber::filter::EnvFilter;

/// Stand-in backend for running the filter layers without a translation
/// engine attached: hands the pre-rewritten text through unchanged.
struct PassthroughBackend;

impl TranslationBackend for PassthroughBackend {
    fn translate(&self, text: &str) -> Result<String, BoxError> {
        Ok(text.to_string())
    }
}

/// Initialize logging, writing to NIKKAN_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var("NIKKAN_LOG_PATH") {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(file)
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();

    let ctx = Arc::new(FilterContext::new(ConfigHandle::load_default()));
    ctx.clean_stale_exports();
    ctx.reload_all();

    let dict_dir = PathBuf::from(ctx.config().snapshot().dict_directory);
    if let Err(e) = std::fs::create_dir_all(&dict_dir) {
        tracing::warn!(dir = %dict_dir.display(), "could not create dictionary directory: {e}");
    }

    // Keep the handle alive for the whole session or watching stops
    let _watch = match watch_directory(&dict_dir) {
        Ok((handle, rx)) => {
            tokio::spawn(ReloadCoordinator::new(Arc::clone(&ctx), rx).run());
            Some(handle)
        }
        Err(e) => {
            tracing::warn!("directory watch unavailable: {e}");
            None
        }
    };

    let pipeline = TranslationPipeline::new(Arc::clone(&ctx), Box::new(PassthroughBackend));

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "> ").map_err(|e| e.to_string())?;
        stdout.flush().map_err(|e| e.to_string())?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| e.to_string())?;
        if read == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        match pipeline.translate(line) {
            Ok(output) => writeln!(stdout, "{output}").map_err(|e| e.to_string())?,
            Err(e) => writeln!(stdout, "error: {e}").map_err(|e| e.to_string())?,
        }
    }

    Ok(())
}
