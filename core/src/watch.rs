//! Filesystem change events
//!
//! Thin wrapper over `notify` that turns raw filesystem notifications
//! into a stream of [`ChangeEvent`]s on a tokio channel. The reload
//! coordinator consumes the stream without ever touching `notify`
//! types, so tests can feed it synthetic events through the same
//! channel.

use std::path::Path;

use chrono::{DateTime, Utc};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::warn;

/// One observed change to a file in the watched directory.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// File name only, no directory component.
    pub filename: String,
    pub timestamp: DateTime<Utc>,
}

/// Keeps the underlying watcher alive. Dropping it ends the stream.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
}

/// Watch `dir` (non-recursively) for created, modified, and removed
/// files.
///
/// Events are delivered on the returned channel. Bursts beyond the
/// channel capacity are dropped; the coordinator's debounce makes any
/// one surviving event per file sufficient.
pub fn watch_directory(
    dir: &Path,
) -> Result<(WatchHandle, mpsc::Receiver<ChangeEvent>), notify::Error> {
    let (tx, rx) = mpsc::channel(256);

    let mut watcher = notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                warn!("watch error: {e}");
                return;
            }
        };
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }
        for path in event.paths {
            let Some(name) = path.file_name() else {
                continue;
            };
            let _ = tx.try_send(ChangeEvent {
                filename: name.to_string_lossy().to_string(),
                timestamp: Utc::now(),
            });
        }
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    Ok((WatchHandle { _watcher: watcher }, rx))
}
