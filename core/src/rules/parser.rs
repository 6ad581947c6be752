//! Rule file parsing
//!
//! A phase's rules come from every `PreFilter*.txt` / `PostFilter*.txt`
//! file in the dictionary directory (case-insensitive prefix). Each line
//! is `pattern <TAB> replacement <TAB> layer <TAB> is_regex`; `//` lines
//! are comments. Bad lines are dropped individually, unreadable files are
//! skipped, and whatever loaded cleanly still goes live.

use std::fs;
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};
use std::time::Instant;

use nikkan_types::Phase;
use regex::Regex;
use tracing::{info, warn};

use crate::error::FilterError;

use super::{LoadReport, RewriteRule, RuleMatcher};

/// Load and sort all rules for one phase.
///
/// # Returns
/// The accepted rules ordered ascending by `(layer, global_line)`, plus
/// the per-load counters. A missing or empty directory yields an empty
/// list, not an error.
pub fn load_phase_rules(dir: &Path, phase: Phase) -> (Vec<RewriteRule>, LoadReport) {
    let start = Instant::now();
    let mut rules = Vec::new();
    let mut report = LoadReport::default();
    let mut global_line = 1usize;

    for path in files_with_prefix(dir, phase.file_prefix()) {
        let file_name = display_name(&path);
        match read_text_file(&path) {
            Ok(content) => {
                let before = report.accepted;
                parse_rule_lines(
                    &content,
                    &file_name,
                    phase,
                    &mut global_line,
                    &mut rules,
                    &mut report,
                );
                report.files_read += 1;
                info!(
                    file = %file_name,
                    rules = report.accepted - before,
                    "{} file loaded",
                    phase.label()
                );
            }
            Err(e) => {
                report.files_failed += 1;
                let err = FilterError::ConfigUnreadable { path, source: e };
                warn!("{} load: {err}", phase.label());
            }
        }
    }

    rules.sort_by_key(|r| (r.layer, r.global_line));

    info!(
        total = rules.len(),
        files = report.files_read,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "{} load complete",
        phase.label()
    );
    (rules, report)
}

/// Parse one file's worth of rule lines into `out`.
///
/// `global_line` advances for every physical line (comments included) so
/// relative order across files is preserved by the later sort.
pub(crate) fn parse_rule_lines(
    content: &str,
    file_name: &str,
    phase: Phase,
    global_line: &mut usize,
    out: &mut Vec<RewriteRule>,
    report: &mut LoadReport,
) {
    for (idx, line) in content.lines().enumerate() {
        let local_line = idx + 1;
        let this_global = *global_line;
        *global_line += 1;

        if line.starts_with("//") {
            continue;
        }

        let fields: Vec<&str> = line.splitn(5, '\t').collect();
        if fields.len() < 3 {
            continue;
        }

        let pattern = fields[0];
        let replacement = fields[1].to_string();
        let layer = lenient_int(fields[2]);
        let is_regex = fields.get(3).map(|f| lenient_int(f) == 1).unwrap_or(false);

        if pattern.is_empty() {
            report.rejected += 1;
            warn!(
                file = %file_name,
                line = local_line,
                "{}: empty pattern, line dropped",
                phase.label()
            );
            continue;
        }

        let matcher = if is_regex {
            match Regex::new(pattern) {
                Ok(regex) => RuleMatcher::Pattern(regex),
                Err(e) => {
                    report.rejected += 1;
                    let err = FilterError::PatternCompile {
                        file: file_name.to_string(),
                        line: local_line,
                        source: e,
                    };
                    warn!(
                        pattern = %pattern,
                        replacement = %replacement,
                        layer,
                        "{}: line dropped: {err}",
                        phase.label()
                    );
                    continue;
                }
            }
        } else {
            RuleMatcher::Literal(pattern.to_string())
        };

        report.accepted += 1;
        out.push(RewriteRule {
            source_file: file_name.to_string(),
            local_line,
            global_line: this_global,
            matcher,
            replacement,
            layer,
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared file helpers (also used by the skip-layer and dictionary loaders)
// ─────────────────────────────────────────────────────────────────────────────

/// Files in `dir` whose name starts with `prefix` (case-insensitive) and
/// ends in `.txt`, sorted by name for deterministic load order.
pub(crate) fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        warn!(dir = %dir.display(), "directory not readable, loading nothing");
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            name.starts_with(prefix) && name.ends_with(".txt")
        })
        .collect();
    files.sort();
    files
}

/// Read a UTF-8 text file, stripping a leading BOM if present.
pub(crate) fn read_text_file(path: &Path) -> IoResult<String> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .strip_prefix('\u{feff}')
        .map(str::to_string)
        .unwrap_or(content))
}

/// File name for diagnostics (`PreFilter2.txt`, not the whole path).
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Integer field parse with legacy tolerance: leading digits win, any
/// trailing junk is ignored, and a field with no digits reads as 0.
pub(crate) fn lenient_int(field: &str) -> i32 {
    let trimmed = field.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i32>().map(|v| sign * v).unwrap_or(0)
}
