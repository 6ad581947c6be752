//! Text dictionary parsing
//!
//! `UserDict*.txt` lines are `source <TAB> target <TAB> flag <TAB>
//! attributes`, where the flag and attributes are optional and an inline
//! `//` truncates the line mid-field. Flag `0` or `2` marks a common
//! word; every other value (or no flag) reads as a noun.

use std::path::Path;

use nikkan_types::TermCategory;
use tracing::{info, warn};

use crate::codec::TextCodec;
use crate::error::FilterError;
use crate::rules::parser::{display_name, files_with_prefix, read_text_file};

use super::{DictReport, TermEntry, validate_entry};

pub(super) const FILE_PREFIX: &str = "userdict";

/// Parse every `UserDict*` text file in `dir`, appending to `out`.
pub(super) fn load_text_files(
    dir: &Path,
    codec: &dyn TextCodec,
    global_line: &mut usize,
    out: &mut Vec<TermEntry>,
    report: &mut DictReport,
) {
    for path in files_with_prefix(dir, FILE_PREFIX) {
        load_text_file(&path, codec, global_line, out, report);
    }
}

/// Parse one text dictionary file (also used for the companion file,
/// which lives outside the dictionary directory).
pub(super) fn load_text_file(
    path: &Path,
    codec: &dyn TextCodec,
    global_line: &mut usize,
    out: &mut Vec<TermEntry>,
    report: &mut DictReport,
) {
    let file_name = display_name(path);
    match read_text_file(path) {
        Ok(content) => {
            let before = out.len();
            parse_dict_lines(&content, &file_name, codec, global_line, out, report);
            report.files_read += 1;
            info!(
                file = %file_name,
                entries = out.len() - before,
                "user dictionary file loaded"
            );
        }
        Err(e) => {
            report.files_failed += 1;
            let err = FilterError::ConfigUnreadable {
                path: path.to_path_buf(),
                source: e,
            };
            warn!("user dictionary load: {err}");
        }
    }
}

pub(super) fn parse_dict_lines(
    content: &str,
    file_name: &str,
    codec: &dyn TextCodec,
    global_line: &mut usize,
    out: &mut Vec<TermEntry>,
    report: &mut DictReport,
) {
    for (idx, line) in content.lines().enumerate() {
        let local_line = idx + 1;

        if line.starts_with("//") {
            continue;
        }

        // Inline comment truncates the rest of the line
        let body = match line.find("//") {
            Some(pos) => &line[..pos],
            None => line,
        };

        let fields: Vec<&str> = body.splitn(5, '\t').collect();
        if fields.len() < 2 {
            continue;
        }

        let entry = TermEntry {
            source_text: fields[0].to_string(),
            target_text: fields[1].to_string(),
            category: fields
                .get(2)
                .map(|f| TermCategory::from_flag(f))
                .unwrap_or(TermCategory::Noun),
            attributes: fields.get(3).map(|f| f.to_string()).unwrap_or_default(),
            source_file: file_name.to_string(),
            local_line,
            global_line: *global_line,
        };

        match validate_entry(&entry, codec) {
            Ok(()) => {
                report.accepted += 1;
                *global_line += 1;
                out.push(entry);
            }
            Err(e) => {
                report.rejected += 1;
                warn!("user dictionary entry rejected: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LegacyCodec;

    fn parse(content: &str) -> (Vec<TermEntry>, DictReport) {
        let mut out = Vec::new();
        let mut report = DictReport::default();
        let mut global = 1;
        parse_dict_lines(
            content,
            "UserDict.txt",
            &LegacyCodec,
            &mut global,
            &mut out,
            &mut report,
        );
        (out, report)
    }

    #[test]
    fn parses_full_line() {
        let (entries, report) = parse("研究所\t연구소\t1\tNAME\n");
        assert_eq!(report.accepted, 1);
        assert_eq!(entries[0].source_text, "研究所");
        assert_eq!(entries[0].target_text, "연구소");
        assert_eq!(entries[0].category, TermCategory::Noun);
        assert_eq!(entries[0].attributes, "NAME");
    }

    #[test]
    fn flag_zero_and_two_mean_common() {
        let (entries, _) = parse("a\tb\t0\nc\td\t2\ne\tf\t9\ng\th\n");
        let cats: Vec<TermCategory> = entries.iter().map(|e| e.category).collect();
        assert_eq!(
            cats,
            vec![
                TermCategory::Common,
                TermCategory::Common,
                TermCategory::Noun,
                TermCategory::Noun
            ]
        );
    }

    #[test]
    fn inline_comment_truncates() {
        let (entries, _) = parse("研究所\t연구소\t1\tATTR// trailing note\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attributes, "ATTR");

        // Comment before the target leaves a one-field line, dropped
        let (entries, _) = parse("研究所// no target\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn whole_line_comment_and_short_lines_skipped() {
        let (entries, report) = parse("// header\nlonely_field\n\na\tb\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].local_line, 4);
        assert_eq!(report.rejected, 0);
    }

    #[test]
    fn oversize_source_rejected_file_continues() {
        // 16 two-byte kana = 32 bytes in the Japanese codepage
        let long = "ア".repeat(16);
        let content = format!("{long}\tx\t1\nok\ty\t1\n");
        let (entries, report) = parse(&content);
        assert_eq!(entries.len(), 1, "later entries in the file survive");
        assert_eq!(entries[0].source_text, "ok");
        assert_eq!(report.rejected, 1);
    }

    #[test]
    fn oversize_attributes_rejected() {
        let attr = "가".repeat(19); // 38 bytes in the Korean codepage
        let (entries, report) = parse(&format!("a\tb\t1\t{attr}\n"));
        assert!(entries.is_empty());
        assert_eq!(report.rejected, 1);
    }

    #[test]
    fn boundary_lengths_are_accepted() {
        // Exactly 31 bytes source (15 kana + 1 ASCII), 37-byte attributes
        let source = format!("{}x", "ア".repeat(15));
        let attr = format!("{}y", "가".repeat(18));
        let (entries, report) = parse(&format!("{source}\tb\t1\t{attr}\n"));
        assert_eq!(report.accepted, 1);
        assert_eq!(entries.len(), 1);
    }
}
