//! Shared types for the nikkan translation filter.
//!
//! Plain data types used across the core engine and the driver binaries.
//! Anything with behavior (stores, parsers, the rewrite engine) lives in
//! `nikkan-core`; this crate stays dependency-light so every member can
//! share it without dragging the engine along.

use serde::{Deserialize, Serialize};

/// Which side of the backend translation a rule applies to.
///
/// `Pre` rules run on source-language text before it is handed to the
/// translation backend; `Post` rules run on the translated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Pre,
    Post,
}

impl Phase {
    /// Case-insensitive filename prefix for this phase's rule files.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Phase::Pre => "prefilter",
            Phase::Post => "postfilter",
        }
    }

    /// Tag used in skip-layer files (`PRE` / `POST`, literal match).
    pub fn tag(self) -> &'static str {
        match self {
            Phase::Pre => "PRE",
            Phase::Post => "POST",
        }
    }

    /// Display label used in log output.
    ///
    /// # Examples
    /// ```
    /// use nikkan_types::Phase;
    /// assert_eq!(Phase::Pre.label(), "PreFilter");
    /// assert_eq!(Phase::Post.label(), "PostFilter");
    /// ```
    pub fn label(self) -> &'static str {
        match self {
            Phase::Pre => "PreFilter",
            Phase::Post => "PostFilter",
        }
    }
}

/// Dictionary term classification, consumed by the backend's formatter.
///
/// The legacy record format encodes this as a five-byte part-of-speech
/// code; text dictionaries use a single flag field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermCategory {
    Common,
    Noun,
}

impl TermCategory {
    /// Part-of-speech code written into exported binary records.
    pub fn pos_code(self) -> &'static str {
        match self {
            TermCategory::Common => "A9D0",
            TermCategory::Noun => "I110",
        }
    }

    /// Classify a part-of-speech code read from a binary record.
    /// Anything that is not the common-word code counts as a noun.
    pub fn from_pos_code(code: &str) -> Self {
        if code == "A9D0" {
            TermCategory::Common
        } else {
            TermCategory::Noun
        }
    }

    /// Classify a text-dictionary category flag: `0` and `2` mark common
    /// words, anything else is a noun.
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "0" | "2" => TermCategory::Common,
            _ => TermCategory::Noun,
        }
    }
}

/// One reloadable configuration category, as classified from a changed
/// filename. Debouncing coalesces events per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReloadCategory {
    PreFilter,
    PostFilter,
    SkipLayer,
    UserDict,
    Config,
}

impl ReloadCategory {
    pub fn label(self) -> &'static str {
        match self {
            ReloadCategory::PreFilter => "PreFilter",
            ReloadCategory::PostFilter => "PostFilter",
            ReloadCategory::SkipLayer => "SkipLayer",
            ReloadCategory::UserDict => "UserDict",
            ReloadCategory::Config => "Config",
        }
    }
}

/// Snapshot of the runtime switches the engine and merger consult.
///
/// Derived from the persisted config at the start of each operation so a
/// toggle landing mid-call cannot flip behavior halfway through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterSwitches {
    pub pre_filter: bool,
    pub post_filter: bool,
    pub user_dict: bool,
    pub log_rewrites: bool,
}

impl FilterSwitches {
    pub fn phase_enabled(&self, phase: Phase) -> bool {
        match phase {
            Phase::Pre => self.pre_filter,
            Phase::Post => self.post_filter,
        }
    }
}

impl Default for FilterSwitches {
    fn default() -> Self {
        Self {
            pre_filter: true,
            post_filter: true,
            user_dict: true,
            log_rewrites: false,
        }
    }
}
