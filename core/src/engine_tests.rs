//! Tests for the rewrite engine's layer gating and replacement semantics

use nikkan_types::{FilterSwitches, Phase};
use regex::Regex;

use crate::engine::rewrite;
use crate::rules::{RewriteRule, RuleMatcher, RulesetSnapshot, SkipCondition};

fn literal(pattern: &str, replacement: &str, layer: i32, position: usize) -> RewriteRule {
    RewriteRule {
        source_file: "test.txt".to_string(),
        local_line: position,
        global_line: position,
        matcher: RuleMatcher::Literal(pattern.to_string()),
        replacement: replacement.to_string(),
        layer,
    }
}

fn pattern(pattern: &str, replacement: &str, layer: i32, position: usize) -> RewriteRule {
    RewriteRule {
        source_file: "test.txt".to_string(),
        local_line: position,
        global_line: position,
        matcher: RuleMatcher::Pattern(Regex::new(pattern).unwrap()),
        replacement: replacement.to_string(),
        layer,
    }
}

fn gate(phase: Phase, layer: i32, condition: &str, position: usize) -> SkipCondition {
    SkipCondition {
        phase,
        layer,
        condition: Regex::new(condition).unwrap(),
        source_file: "SkipLayer.txt".to_string(),
        local_line: position,
        global_line: position,
    }
}

fn snapshot(pre: Vec<RewriteRule>, conditions: Vec<SkipCondition>) -> RulesetSnapshot {
    RulesetSnapshot {
        generation: 1,
        pre_rules: pre,
        post_rules: Vec::new(),
        skip_conditions: conditions,
    }
}

fn on() -> FilterSwitches {
    FilterSwitches::default()
}

#[test]
fn literal_replaces_every_occurrence_left_to_right() {
    let snap = snapshot(vec![literal("ab", "X", 0, 1)], vec![]);
    assert_eq!(rewrite(Phase::Pre, "ab-ab-ab", &snap, on()), "X-X-X");

    // Non-overlapping, leftmost first
    let snap = snapshot(vec![literal("aa", "b", 0, 1)], vec![]);
    assert_eq!(rewrite(Phase::Pre, "aaa", &snap, on()), "ba");
}

#[test]
fn literal_is_idempotent_when_replacement_has_no_pattern() {
    let snap = snapshot(vec![literal("_", " ", 0, 1)], vec![]);
    let once = rewrite(Phase::Pre, "a_b_c", &snap, on());
    assert_eq!(once, "a b c");
    assert_eq!(rewrite(Phase::Pre, &once, &snap, on()), once);
}

#[test]
fn regex_replaces_all_matches_in_one_pass() {
    let snap = snapshot(vec![pattern(r"\d+", "#", 0, 1)], vec![]);
    assert_eq!(rewrite(Phase::Pre, "abc123def456", &snap, on()), "abc#def#");
}

#[test]
fn regex_replacement_expands_captures() {
    let snap = snapshot(vec![pattern(r"「(.+?)」", "<$1>", 0, 1)], vec![]);
    assert_eq!(
        rewrite(Phase::Pre, "彼は「はい」と「いいえ」を言った", &snap, on()),
        "彼は<はい>と<いいえ>を言った"
    );
}

#[test]
fn matching_condition_lets_layer_run() {
    let snap = snapshot(
        vec![literal("_", " ", 0, 1)],
        vec![gate(Phase::Pre, 0, "^CMD", 1)],
    );
    assert_eq!(rewrite(Phase::Pre, "CMD_TEST", &snap, on()), "CMD TEST");
}

#[test]
fn failing_condition_skips_whole_layer() {
    let snap = snapshot(
        vec![literal("_", " ", 0, 1), literal("X", "Y", 0, 2)],
        vec![gate(Phase::Pre, 0, "^CMD", 1)],
    );
    assert_eq!(rewrite(Phase::Pre, "OTHER_TEXT", &snap, on()), "OTHER_TEXT");
}

#[test]
fn skip_applies_per_layer_not_per_pass() {
    // Layer 0 is gated away, layer 1 still runs
    let snap = snapshot(
        vec![literal("a", "b", 0, 1), literal("1", "2", 1, 2)],
        vec![gate(Phase::Pre, 0, "^never", 1)],
    );
    assert_eq!(rewrite(Phase::Pre, "a1", &snap, on()), "a2");
}

#[test]
fn all_conditions_must_match_for_layer_to_run() {
    let conditions = vec![
        gate(Phase::Pre, 0, "foo", 1),
        gate(Phase::Pre, 0, "bar", 2),
    ];
    let rules = vec![literal("-", "+", 0, 1)];

    let snap = snapshot(rules.clone(), conditions.clone());
    assert_eq!(rewrite(Phase::Pre, "foo-bar", &snap, on()), "foo+bar");

    let snap = snapshot(rules, conditions);
    assert_eq!(rewrite(Phase::Pre, "foo-baz", &snap, on()), "foo-baz");
}

#[test]
fn gate_sees_text_mutated_by_earlier_layers() {
    // Layer 0 rewrites the text into the form layer 1's gate requires
    let snap = snapshot(
        vec![literal("X", "CMD", 0, 1), literal("_", " ", 1, 2)],
        vec![gate(Phase::Pre, 1, "^CMD", 1)],
    );
    assert_eq!(rewrite(Phase::Pre, "X_1", &snap, on()), "CMD 1");

    // Without the layer 0 rewrite the gate fails and layer 1 is skipped
    let snap = snapshot(
        vec![literal("_", " ", 1, 1)],
        vec![gate(Phase::Pre, 1, "^CMD", 1)],
    );
    assert_eq!(rewrite(Phase::Pre, "X_1", &snap, on()), "X_1");
}

#[test]
fn conditions_of_other_phase_do_not_gate() {
    let snap = snapshot(
        vec![literal("_", " ", 0, 1)],
        vec![gate(Phase::Post, 0, "^never", 1)],
    );
    assert_eq!(rewrite(Phase::Pre, "A_B", &snap, on()), "A B");
}

#[test]
fn disabled_phase_returns_input_unchanged() {
    let snap = snapshot(vec![literal("a", "b", 0, 1)], vec![]);
    let switches = FilterSwitches {
        pre_filter: false,
        ..Default::default()
    };
    assert_eq!(rewrite(Phase::Pre, "aaa", &snap, switches), "aaa");
}

#[test]
fn empty_rule_list_is_a_no_op() {
    let snap = RulesetSnapshot::default();
    assert_eq!(rewrite(Phase::Pre, "untouched", &snap, on()), "untouched");
    assert_eq!(rewrite(Phase::Post, "untouched", &snap, on()), "untouched");
}

#[test]
fn rules_of_both_phases_stay_separate() {
    let snap = RulesetSnapshot {
        generation: 1,
        pre_rules: vec![literal("a", "PRE", 0, 1)],
        post_rules: vec![literal("a", "POST", 0, 1)],
        skip_conditions: Vec::new(),
    };
    assert_eq!(rewrite(Phase::Pre, "a", &snap, on()), "PRE");
    assert_eq!(rewrite(Phase::Post, "a", &snap, on()), "POST");
}

#[test]
fn rules_apply_in_layer_then_position_order() {
    // Sorted order: (0,1) turns "a" into "b", then (1,2) turns "bb" into "c"
    let snap = snapshot(
        vec![literal("a", "b", 0, 1), literal("bb", "c", 1, 2)],
        vec![],
    );
    assert_eq!(rewrite(Phase::Pre, "ab", &snap, on()), "c");
}

#[test]
fn discarded_bad_pattern_has_no_effect_on_rewrites() {
    use crate::rules::LoadReport;

    let mut rules = Vec::new();
    let mut report = LoadReport::default();
    let mut global = 1;
    crate::rules::parser::parse_rule_lines(
        "([bad\tX\t0\t1\nok\tOK\t0\t0\n",
        "PreFilter.txt",
        Phase::Pre,
        &mut global,
        &mut rules,
        &mut report,
    );
    assert_eq!(report.rejected, 1);

    let snap = snapshot(rules, vec![]);
    assert_eq!(rewrite(Phase::Pre, "([bad ok", &snap, on()), "([bad OK");
}
