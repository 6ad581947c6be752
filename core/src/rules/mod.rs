//! Rewrite rules, skip conditions, and the published ruleset snapshot
//!
//! Rule and skip-layer files are parsed into immutable, pre-sorted lists
//! bundled as a [`RulesetSnapshot`]. The snapshot is the unit of hot
//! reload: a rebuild constructs the next generation fully off to the
//! side, then publishes it with one pointer swap, so a rewrite in flight
//! keeps the generation it started with and never observes a half-built
//! list.

pub(crate) mod parser;
mod skip;

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use nikkan_types::Phase;
use regex::Regex;

pub use parser::load_phase_rules;
pub use skip::load_skip_conditions;

/// How a rule matches: a plain substring or a compiled regex.
///
/// Regexes compile at load time. A pattern that fails to compile never
/// reaches a snapshot, so matching itself cannot fail.
#[derive(Debug, Clone)]
pub enum RuleMatcher {
    Literal(String),
    Pattern(Regex),
}

impl RuleMatcher {
    /// The pattern as written in the rule file.
    pub fn pattern_text(&self) -> &str {
        match self {
            RuleMatcher::Literal(text) => text,
            RuleMatcher::Pattern(regex) => regex.as_str(),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, RuleMatcher::Pattern(_))
    }
}

/// One substitution rule from a filter file.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    /// File the rule came from, for diagnostics.
    pub source_file: String,
    /// 1-based line within the source file.
    pub local_line: usize,
    /// Position across all files of the phase, in read order. Breaks
    /// ordering ties within a layer.
    pub global_line: usize,
    pub matcher: RuleMatcher,
    pub replacement: String,
    pub layer: i32,
}

/// One gating condition from a skip-layer file.
#[derive(Debug, Clone)]
pub struct SkipCondition {
    pub phase: Phase,
    pub layer: i32,
    pub condition: Regex,
    pub source_file: String,
    pub local_line: usize,
    pub global_line: usize,
}

/// Counters reported by a single load pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files_read: usize,
    pub files_failed: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl LoadReport {
    pub fn absorb(&mut self, other: LoadReport) {
        self.files_read += other.files_read;
        self.files_failed += other.files_failed;
        self.accepted += other.accepted;
        self.rejected += other.rejected;
    }
}

/// One immutable generation of rules and conditions.
#[derive(Debug, Default)]
pub struct RulesetSnapshot {
    pub generation: u64,
    pub pre_rules: Vec<RewriteRule>,
    pub post_rules: Vec<RewriteRule>,
    pub skip_conditions: Vec<SkipCondition>,
}

impl RulesetSnapshot {
    pub fn rules(&self, phase: Phase) -> &[RewriteRule] {
        match phase {
            Phase::Pre => &self.pre_rules,
            Phase::Post => &self.post_rules,
        }
    }

    /// Conditions gating `(phase, layer)`, in stored order.
    pub fn conditions_for(
        &self,
        phase: Phase,
        layer: i32,
    ) -> impl Iterator<Item = &SkipCondition> + '_ {
        self.skip_conditions
            .iter()
            .filter(move |c| c.phase == phase && c.layer == layer)
    }
}

/// Holds the current [`RulesetSnapshot`] and serializes reloads.
///
/// Readers clone the `Arc` under a momentary read lock and keep using
/// that generation for as long as they need it. Reloads serialize on a
/// separate mutex so the second of two concurrent reloads builds on top
/// of the first's published result; neither is lost or interleaved.
pub struct RulesetStore {
    current: RwLock<Arc<RulesetSnapshot>>,
    reload_lock: Mutex<()>,
}

impl Default for RulesetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesetStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(RulesetSnapshot::default())),
            reload_lock: Mutex::new(()),
        }
    }

    /// The currently published generation.
    pub fn current(&self) -> Arc<RulesetSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Rebuild one phase's rules from `dir`, carrying the other phase and
    /// the skip conditions into the new generation unchanged.
    pub fn reload_phase(&self, dir: &Path, phase: Phase) -> (Arc<RulesetSnapshot>, LoadReport) {
        let mut report = LoadReport::default();
        let snapshot = self.publish(|base| {
            let (rules, r) = load_phase_rules(dir, phase);
            report = r;
            let mut next = RulesetSnapshot {
                generation: 0,
                pre_rules: base.pre_rules.clone(),
                post_rules: base.post_rules.clone(),
                skip_conditions: base.skip_conditions.clone(),
            };
            match phase {
                Phase::Pre => next.pre_rules = rules,
                Phase::Post => next.post_rules = rules,
            }
            next
        });
        (snapshot, report)
    }

    /// Rebuild the skip conditions from `dir`, carrying both rule lists
    /// forward.
    pub fn reload_skip(&self, dir: &Path) -> (Arc<RulesetSnapshot>, LoadReport) {
        let mut report = LoadReport::default();
        let snapshot = self.publish(|base| {
            let (conditions, r) = load_skip_conditions(dir);
            report = r;
            RulesetSnapshot {
                generation: 0,
                pre_rules: base.pre_rules.clone(),
                post_rules: base.post_rules.clone(),
                skip_conditions: conditions,
            }
        });
        (snapshot, report)
    }

    /// Rebuild everything from `dir` as one new generation.
    pub fn reload_all(&self, dir: &Path) -> (Arc<RulesetSnapshot>, LoadReport) {
        let mut report = LoadReport::default();
        let snapshot = self.publish(|_| {
            let (pre_rules, pre_report) = load_phase_rules(dir, Phase::Pre);
            let (post_rules, post_report) = load_phase_rules(dir, Phase::Post);
            let (skip_conditions, skip_report) = load_skip_conditions(dir);
            report.absorb(pre_report);
            report.absorb(post_report);
            report.absorb(skip_report);
            RulesetSnapshot {
                generation: 0,
                pre_rules,
                post_rules,
                skip_conditions,
            }
        });
        (snapshot, report)
    }

    /// Build the next generation under the reload lock and swap it in.
    /// The builder sees the base snapshot that was current once the lock
    /// was held, so serialized reloads compose instead of racing.
    fn publish(
        &self,
        build: impl FnOnce(&RulesetSnapshot) -> RulesetSnapshot,
    ) -> Arc<RulesetSnapshot> {
        let _reload = self
            .reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let base = self.current();
        let mut next = build(&base);
        next.generation = base.generation + 1;
        let next = Arc::new(next);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        next
    }
}
