//! Skip-layer file parsing
//!
//! `SkipLayer*.txt` lines are `PHASE <TAB> layer <TAB> condition`. The
//! phase tag is a case-sensitive literal on the first characters (`PRE` /
//! `POST`); the condition is a regex the current text must match for the
//! layer's rules to run.

use std::path::Path;
use std::time::Instant;

use nikkan_types::Phase;
use regex::Regex;
use tracing::{info, warn};

use crate::error::FilterError;

use super::parser::{display_name, files_with_prefix, lenient_int, read_text_file};
use super::{LoadReport, SkipCondition};

const FILE_PREFIX: &str = "skiplayer";

/// Load all skip conditions for both phases.
///
/// Returned sorted by `(phase, layer, global_line)` so the conditions for
/// one `(phase, layer)` form a contiguous run in stored order.
pub fn load_skip_conditions(dir: &Path) -> (Vec<SkipCondition>, LoadReport) {
    let start = Instant::now();
    let mut conditions = Vec::new();
    let mut report = LoadReport::default();
    let mut global_line = 1usize;

    for path in files_with_prefix(dir, FILE_PREFIX) {
        let file_name = display_name(&path);
        match read_text_file(&path) {
            Ok(content) => {
                let before = report.accepted;
                parse_skip_lines(
                    &content,
                    &file_name,
                    &mut global_line,
                    &mut conditions,
                    &mut report,
                );
                report.files_read += 1;
                info!(
                    file = %file_name,
                    conditions = report.accepted - before,
                    "SkipLayer file loaded"
                );
            }
            Err(e) => {
                report.files_failed += 1;
                let err = FilterError::ConfigUnreadable { path, source: e };
                warn!("SkipLayer load: {err}");
            }
        }
    }

    conditions.sort_by_key(|c| (matches!(c.phase, Phase::Post), c.layer, c.global_line));

    info!(
        total = conditions.len(),
        files = report.files_read,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "SkipLayer load complete"
    );
    (conditions, report)
}

pub(crate) fn parse_skip_lines(
    content: &str,
    file_name: &str,
    global_line: &mut usize,
    out: &mut Vec<SkipCondition>,
    report: &mut LoadReport,
) {
    for (idx, line) in content.lines().enumerate() {
        let local_line = idx + 1;
        let this_global = *global_line;
        *global_line += 1;

        if line.starts_with("//") {
            continue;
        }

        let fields: Vec<&str> = line.splitn(4, '\t').collect();
        if fields.len() < 2 {
            continue;
        }

        // Tags compare as case-sensitive literal prefixes
        let phase = if fields[0].starts_with("PRE") {
            Phase::Pre
        } else if fields[0].starts_with("POST") {
            Phase::Post
        } else {
            continue;
        };

        let layer = lenient_int(fields[1]);
        // A missing condition compiles as the empty regex, which matches
        // everything, so the layer always runs
        let pattern = fields.get(2).copied().unwrap_or("");

        let condition = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                report.rejected += 1;
                let err = FilterError::PatternCompile {
                    file: file_name.to_string(),
                    line: local_line,
                    source: e,
                };
                warn!(
                    phase = phase.tag(),
                    layer,
                    pattern = %pattern,
                    "SkipLayer: line dropped: {err}"
                );
                continue;
            }
        };

        report.accepted += 1;
        out.push(SkipCondition {
            phase,
            layer,
            condition,
            source_file: file_name.to_string(),
            local_line,
            global_line: this_global,
        });
    }
}
