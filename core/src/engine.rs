//! Layered text rewriting
//!
//! Applies one phase's rule list to a text. Rules arrive pre-sorted by
//! `(layer, position)`, so each layer is a contiguous run; entering a new
//! layer re-evaluates that layer's skip conditions against the text as
//! rewritten so far. A condition that fails to match skips the whole
//! layer and ends condition evaluation for it.

use std::borrow::Cow;
use std::time::Instant;

use nikkan_types::{FilterSwitches, Phase};
use tracing::{debug, info};

use crate::rules::{RuleMatcher, RulesetSnapshot};

/// Run `text` through one phase of the given snapshot.
///
/// A disabled phase and an empty rule list both return the input
/// unchanged. Rewriting itself cannot fail: every pattern in a snapshot
/// compiled at load time.
pub fn rewrite(
    phase: Phase,
    text: &str,
    snapshot: &RulesetSnapshot,
    switches: FilterSwitches,
) -> String {
    if !switches.phase_enabled(phase) {
        info!("{} is off", phase.label());
        return text.to_string();
    }

    let start = Instant::now();
    let mut current = text.to_string();
    let mut active_layer: Option<i32> = None;
    let mut layer_skipped = false;
    let mut skipped_layers: Vec<i32> = Vec::new();

    for rule in snapshot.rules(phase) {
        if active_layer != Some(rule.layer) {
            active_layer = Some(rule.layer);
            layer_skipped = false;
            // Gate on the current text, not the original input
            for gate in snapshot.conditions_for(phase, rule.layer) {
                if !gate.condition.is_match(&current) {
                    layer_skipped = true;
                    skipped_layers.push(rule.layer);
                    break;
                }
            }
        }
        if layer_skipped {
            continue;
        }

        let rewritten = match &rule.matcher {
            RuleMatcher::Literal(pattern) => {
                if current.contains(pattern.as_str()) {
                    Some(current.replace(pattern.as_str(), &rule.replacement))
                } else {
                    None
                }
            }
            RuleMatcher::Pattern(regex) => {
                match regex.replace_all(&current, rule.replacement.as_str()) {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(replaced) => Some(replaced),
                }
            }
        };

        if let Some(rewritten) = rewritten {
            if rewritten != current && switches.log_rewrites {
                debug!(
                    file = %rule.source_file,
                    line = rule.local_line,
                    pattern = %rule.matcher.pattern_text(),
                    replacement = %rule.replacement,
                    layer = rule.layer,
                    regex = rule.matcher.is_regex(),
                    "{} rule applied",
                    phase.label()
                );
            }
            current = rewritten;
        }
    }

    if !skipped_layers.is_empty() {
        debug!(
            phase = phase.label(),
            layers = ?skipped_layers,
            "layers skipped"
        );
    }
    debug!(
        phase = phase.label(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "rewrite pass complete"
    );
    current
}
