//! Offline rule table used when the grammar API is unreachable

use crate::types::{
    CheckResult, IssueCategory, Match, Replacement, Rule, RuleCategory, Severity,
};
use once_cell::sync::Lazy;
use regex::Regex;

const FALLBACK_CONFIDENCE: f32 = 0.8;

struct FallbackRule {
    pattern: Regex,
    /// May reference capture groups (`$1`)
    replacement: &'static str,
    message: &'static str,
    category: IssueCategory,
}

impl FallbackRule {
    fn new(
        pattern: &str,
        replacement: &'static str,
        message: &'static str,
        category: IssueCategory,
    ) -> Self {
        Self {
            pattern: Regex::new(&format!(r"(?i)\b{}\b", pattern)).expect("Valid fallback regex"),
            replacement,
            message,
            category,
        }
    }
}

static RULES: Lazy<Vec<FallbackRule>> = Lazy::new(|| {
    use IssueCategory::{Grammar, Spelling};
    vec![
        FallbackRule::new("teh", "the", "Possible typo", Spelling),
        FallbackRule::new(
            "recieve",
            "receive",
            "Spelling: i before e except after c",
            Spelling,
        ),
        FallbackRule::new("seperate", "separate", "Spelling error", Spelling),
        FallbackRule::new("occured", "occurred", "Spelling: double r", Spelling),
        FallbackRule::new("definately", "definitely", "Spelling error", Spelling),
        FallbackRule::new("begining", "beginning", "Spelling: double n", Spelling),
        FallbackRule::new(
            r"your\s+welcome",
            "you're welcome",
            "Grammar: use \"you're\" (you are)",
            Grammar,
        ),
        FallbackRule::new(
            r"its\s+([a-z]+ing)",
            "it's $1",
            "Grammar: use \"it's\" (it is)",
            Grammar,
        ),
    ]
});

/// Deterministic, network-free checker over a fixed misspelling table
#[derive(Debug, Clone)]
pub struct FallbackMatcher {
    max_matches: usize,
}

impl Default for FallbackMatcher {
    fn default() -> Self {
        Self::new(5)
    }
}

impl FallbackMatcher {
    pub fn new(max_matches: usize) -> Self {
        Self { max_matches }
    }

    /// Matches ordered by offset, at most `max_matches`
    pub fn find(&self, text: &str) -> Vec<Match> {
        let mut matches = Vec::new();

        for rule in RULES.iter() {
            for caps in rule.pattern.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };

                let mut replacement = String::new();
                caps.expand(rule.replacement, &mut replacement);
                let flagged = whole.as_str();

                let category_id = rule.category.as_str().to_uppercase();
                matches.push(Match {
                    offset: text[..whole.start()].chars().count(),
                    length: flagged.chars().count(),
                    message: rule.message.to_string(),
                    short_message: rule.category.as_str().to_string(),
                    replacements: vec![Replacement {
                        value: match_case(flagged, &replacement),
                    }],
                    rule: Rule {
                        id: format!("FALLBACK_{}", category_id),
                        description: String::new(),
                        category: RuleCategory {
                            id: category_id,
                            name: rule.category.as_str().to_string(),
                        },
                    },
                    severity: Severity::Error,
                    category: rule.category,
                    confidence: FALLBACK_CONFIDENCE,
                    preview: None,
                });
            }
        }

        matches.sort_by_key(|m| m.offset);
        matches.truncate(self.max_matches);
        matches
    }

    /// Result flagged as produced offline
    pub fn check(&self, text: &str) -> CheckResult {
        CheckResult {
            matches: self.find(text),
            summary: None,
            fallback: true,
        }
    }
}

/// Capitalize `replacement` when `flagged` starts with an uppercase letter
fn match_case(flagged: &str, replacement: &str) -> String {
    let capitalized = flagged.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if capitalized => first.to_uppercase().chain(chars).collect(),
        _ => replacement.to_string(),
    }
}
