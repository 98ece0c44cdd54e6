//! Core data types for WriteRight
//!
//! Requests, matches and results exchanged between the grammar client, the
//! message router and the editor session. Offsets and lengths are counted in
//! chars (Unicode scalar values) of the text that was checked.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which checker serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// LanguageTool HTTP API
    #[default]
    LanguageTool,
    /// Local rule table only, never touches the network
    Basic,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "languagetool" | "lt" => Ok(Provider::LanguageTool),
            "basic" | "local" | "offline" => Ok(Provider::Basic),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// LanguageTool rule level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    Default,
    #[default]
    Picky,
}

impl CheckLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckLevel::Default => "default",
            CheckLevel::Picky => "picky",
        }
    }
}

/// Effective options of a check; part of the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckOptions {
    pub language: String,
    pub provider: Provider,
    pub level: CheckLevel,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            provider: Provider::default(),
            level: CheckLevel::default(),
        }
    }
}

/// Per-request overrides merged over the persisted settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "apiProvider")]
    pub provider: Option<Provider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CheckLevel>,
}

/// A single grammar check request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub text: String,
    pub options: CheckOptions,
}

impl CheckRequest {
    pub fn new(text: impl Into<String>, options: CheckOptions) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }
}

/// Issue severity; sorts `Error < Warning < Info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    #[default]
    Info,
}

/// Broad issue category shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Spelling,
    Grammar,
    Punctuation,
    Style,
    Spacing,
    #[default]
    Other,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Spelling => "spelling",
            IssueCategory::Grammar => "grammar",
            IssueCategory::Punctuation => "punctuation",
            IssueCategory::Style => "style",
            IssueCategory::Spacing => "spacing",
            IssueCategory::Other => "other",
        }
    }
}

/// Candidate replacement text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub value: String,
}

impl From<&str> for Replacement {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

/// Category reported by the rule source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCategory {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Rule that produced a match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub category: RuleCategory,
}

/// Text around a flagged span
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub before: String,
    pub error: String,
    pub after: String,
    pub suggestion: Option<String>,
}

/// A flagged span of the checked text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Start of the span in chars
    pub offset: usize,
    /// Length of the span in chars
    pub length: usize,
    pub message: String,
    #[serde(default)]
    pub short_message: String,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub rule: Rule,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub category: IssueCategory,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
}

impl Match {
    /// End of the span (exclusive) in chars
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// First replacement, if any
    pub fn best_replacement(&self) -> Option<&str> {
        self.replacements.first().map(|r| r.value.as_str())
    }
}

/// Counts over a set of matches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub categories: BTreeMap<IssueCategory, usize>,
}

impl Summary {
    pub fn from_matches(matches: &[Match]) -> Self {
        let mut summary = Summary {
            total: matches.len(),
            ..Default::default()
        };

        for m in matches {
            match m.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
            *summary.categories.entry(m.category).or_insert(0) += 1;
        }

        summary
    }
}

/// Result of a grammar check; immutable once produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub matches: Vec<Match>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    /// Produced by the local rule table because the API was unreachable
    #[serde(default)]
    pub fallback: bool,
}

/// What a caller gets back from a check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub result: Arc<CheckResult>,
    /// Served from the result cache without an outbound request
    #[serde(default)]
    pub cached: bool,
}

/// Number of chars in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the char at `char_idx` (or `text.len()` past the end)
pub fn byte_index(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Substring by char range, clamped to the text
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start_b = byte_index(text, start);
    let end_b = byte_index(text, end.max(start));
    &text[start_b..end_b]
}

/// Replace the char span `[offset, offset + length)` with `replacement`
///
/// Text outside the span is left untouched.
pub fn splice_chars(text: &str, offset: usize, length: usize, replacement: &str) -> String {
    let start = byte_index(text, offset);
    let end = byte_index(text, offset + length);
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    out
}

/// Apply the first replacement of every non-overlapping match
///
/// Matches are applied right-to-left so earlier offsets stay valid.
pub fn apply_all(text: &str, matches: &[Match]) -> String {
    let mut ordered: Vec<&Match> = matches
        .iter()
        .filter(|m| m.best_replacement().is_some())
        .collect();
    ordered.sort_by_key(|m| m.offset);

    let mut chosen: Vec<&Match> = Vec::new();
    let mut last_end = 0;
    for m in ordered {
        if m.offset >= last_end {
            last_end = m.end();
            chosen.push(m);
        }
    }

    let mut out = text.to_string();
    for m in chosen.into_iter().rev() {
        if let Some(replacement) = m.best_replacement() {
            out = splice_chars(&out, m.offset, m.length, replacement);
        }
    }
    out
}
