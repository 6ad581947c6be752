//! Debounced reload coordination
//!
//! Change events are classified into categories and accumulated; a
//! periodic tick flushes the accumulated set, reloading each touched
//! category at most once per interval no matter how many events landed.
//! Editors that write a file five times in quick succession therefore
//! cost one reload, not five.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use nikkan_types::ReloadCategory;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::context::FilterContext;
use crate::watch::ChangeEvent;

/// How often accumulated changes are flushed into reloads.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(500);

pub struct ReloadCoordinator {
    ctx: Arc<FilterContext>,
    rx: mpsc::Receiver<ChangeEvent>,
}

impl ReloadCoordinator {
    pub fn new(ctx: Arc<FilterContext>, rx: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { ctx, rx }
    }

    /// Consume change events until the sender goes away.
    pub async fn run(mut self) {
        let mut pending = BTreeSet::new();
        let mut tick = interval_at(Instant::now() + FLUSH_INTERVAL, FLUSH_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => {
                        if let Some(category) = self.classify(&event.filename) {
                            pending.insert(category);
                        }
                    }
                    None => {
                        self.flush(&mut pending);
                        debug!("change stream closed, coordinator stopping");
                        return;
                    }
                },
                _ = tick.tick() => self.flush(&mut pending),
            }
        }
    }

    fn classify(&self, filename: &str) -> Option<ReloadCategory> {
        let config = self.ctx.config();
        classify_change(filename, config.file_name().as_deref(), config.snapshot().watch)
    }

    fn flush(&self, pending: &mut BTreeSet<ReloadCategory>) {
        for category in std::mem::take(pending) {
            info!(category = category.label(), "change detected, reloading");
            self.ctx.reload_category(category);
        }
    }
}

/// Map a changed file name to the category it invalidates.
///
/// The config file is recognized by exact name even while the watch
/// switch is off, so a hand edit to the file can turn watching back on.
/// Everything else needs the switch and a `.txt` extension, and
/// classifies by case-insensitive substring.
pub fn classify_change(
    filename: &str,
    config_file: Option<&str>,
    watch: bool,
) -> Option<ReloadCategory> {
    let name = filename.to_lowercase();
    if let Some(config_file) = config_file {
        if name == config_file.to_lowercase() {
            return Some(ReloadCategory::Config);
        }
    }
    if !watch || !name.ends_with(".txt") {
        return None;
    }
    if name.contains("prefilter") {
        Some(ReloadCategory::PreFilter)
    } else if name.contains("postfilter") {
        Some(ReloadCategory::PostFilter)
    } else if name.contains("skiplayer") {
        Some(ReloadCategory::SkipLayer)
    } else if name.contains("userdict") {
        Some(ReloadCategory::UserDict)
    } else {
        None
    }
}
