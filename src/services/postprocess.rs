//! Scoring and filtering of raw API matches

use crate::config::ResultConfig;
use crate::types::{char_len, char_slice, CheckResult, IssueCategory, Match, Preview, Severity, Summary};

const ERROR_TYPES: &[&str] = &["MORFOLOGIK_RULE_EN_US", "GRAMMAR_ERROR", "TYPOS", "WRONG_WORD"];
const WARNING_TYPES: &[&str] = &["STYLE", "REDUNDANCY", "WORDINESS", "REPETITION"];

fn mentions(m: &Match, types: &[&str]) -> bool {
    types
        .iter()
        .any(|t| m.rule.id.contains(t) || m.rule.category.id.contains(t))
}

pub fn severity_for(m: &Match) -> Severity {
    if mentions(m, ERROR_TYPES) {
        Severity::Error
    } else if mentions(m, WARNING_TYPES) {
        Severity::Warning
    } else {
        Severity::Info
    }
}

pub fn category_for(m: &Match) -> IssueCategory {
    let rule_id = m.rule.id.as_str();
    let category_id = m.rule.category.id.as_str();

    if rule_id.contains("MORFOLOGIK") || category_id.contains("TYPOS") {
        IssueCategory::Spelling
    } else if category_id.contains("GRAMMAR") {
        IssueCategory::Grammar
    } else if category_id.contains("PUNCTUATION") {
        IssueCategory::Punctuation
    } else if category_id.contains("STYLE") {
        IssueCategory::Style
    } else if rule_id.contains("WHITESPACE") {
        IssueCategory::Spacing
    } else {
        IssueCategory::Other
    }
}

/// Heuristic likelihood that a match is a real issue, in `[0, 1]`
pub fn confidence_for(m: &Match) -> f32 {
    let mut confidence: f32 = 0.5;

    if m.rule.id.contains("MORFOLOGIK") {
        confidence += 0.3;
    }
    if m.rule.category.id.contains("GRAMMAR") {
        confidence += 0.2;
    }
    if !m.replacements.is_empty() {
        confidence += 0.1;
    }
    if m.length <= 10 {
        confidence += 0.1;
    }
    if m.length > 20 {
        confidence -= 0.2;
    }

    confidence.clamp(0.0, 1.0)
}

pub fn preview_for(text: &str, m: &Match, context: usize) -> Preview {
    let start = m.offset.saturating_sub(context);
    let end = (m.end() + context).min(char_len(text));

    Preview {
        before: char_slice(text, start, m.offset).to_string(),
        error: char_slice(text, m.offset, m.end()).to_string(),
        after: char_slice(text, m.end(), end).to_string(),
        suggestion: m.best_replacement().map(str::to_string),
    }
}

/// Turn raw API matches for `text` into a user-facing result
pub fn process(raw: Vec<Match>, text: &str, config: &ResultConfig) -> CheckResult {
    let mut matches: Vec<Match> = raw
        .into_iter()
        .filter(|m| !m.replacements.is_empty() && m.length > 0 && m.length < config.max_match_length)
        .map(|mut m| {
            m.severity = severity_for(&m);
            m.category = category_for(&m);
            m.preview = Some(preview_for(text, &m, config.preview_context));
            m.confidence = confidence_for(&m);
            m
        })
        .filter(|m| m.confidence > config.confidence_floor)
        .collect();

    matches.sort_by(|a, b| a.severity.cmp(&b.severity).then(a.offset.cmp(&b.offset)));

    let summary = Summary::from_matches(&matches);
    matches.truncate(config.max_matches);

    CheckResult {
        matches,
        summary: Some(summary),
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rule, RuleCategory};

    fn raw(offset: usize, length: usize, rule_id: &str, category_id: &str) -> Match {
        Match {
            offset,
            length,
            message: "issue".to_string(),
            short_message: String::new(),
            replacements: vec!["fix".into()],
            rule: Rule {
                id: rule_id.to_string(),
                description: String::new(),
                category: RuleCategory {
                    id: category_id.to_string(),
                    name: String::new(),
                },
            },
            severity: Severity::default(),
            category: IssueCategory::default(),
            confidence: 0.0,
            preview: None,
        }
    }

    #[test]
    fn test_severity_and_category() {
        let spelling = raw(0, 3, "MORFOLOGIK_RULE_EN_US", "TYPOS");
        assert_eq!(severity_for(&spelling), Severity::Error);
        assert_eq!(category_for(&spelling), IssueCategory::Spelling);

        let style = raw(0, 3, "PASSIVE_VOICE", "STYLE");
        assert_eq!(severity_for(&style), Severity::Warning);
        assert_eq!(category_for(&style), IssueCategory::Style);

        let comma = raw(0, 1, "COMMA_PARENTHESIS", "PUNCTUATION");
        assert_eq!(severity_for(&comma), Severity::Info);
        assert_eq!(category_for(&comma), IssueCategory::Punctuation);

        let space = raw(0, 1, "WHITESPACE_RULE", "TYPOGRAPHY");
        assert_eq!(category_for(&space), IssueCategory::Spacing);
    }

    #[test]
    fn test_confidence_clamped() {
        let best = raw(0, 3, "MORFOLOGIK_RULE_EN_US", "GRAMMAR");
        assert_eq!(confidence_for(&best), 1.0);

        let mut long = raw(0, 30, "X", "Y");
        long.replacements.clear();
        assert!((confidence_for(&long) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_preview_context() {
        let text = "The quick brown fox jumps over teh lazy dog";
        let m = raw(31, 3, "X", "Y");
        let preview = preview_for(text, &m, 20);

        assert_eq!(preview.error, "teh");
        assert_eq!(preview.before, "rown fox jumps over ");
        assert_eq!(preview.after, " lazy dog");
        assert_eq!(preview.suggestion.as_deref(), Some("fix"));
    }

    #[test]
    fn test_process_filters_and_sorts() {
        let text = "a".repeat(200);
        let mut no_fix = raw(5, 2, "X", "Y");
        no_fix.replacements.clear();

        let raw_matches = vec![
            raw(40, 3, "COMMA", "PUNCTUATION"),
            raw(10, 3, "MORFOLOGIK_RULE_EN_US", "TYPOS"),
            raw(20, 3, "PASSIVE", "STYLE"),
            no_fix,
            raw(60, 0, "X", "Y"),
            raw(80, 50, "X", "Y"),
        ];

        let result = process(raw_matches, &text, &ResultConfig::default());
        let offsets: Vec<usize> = result.matches.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![10, 20, 40]);
        assert!(!result.fallback);

        let summary = result.summary.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.info, 1);
    }

    #[test]
    fn test_process_caps_but_summarizes_all() {
        let text = "b".repeat(100);
        let raw_matches = (0..15).map(|i| raw(i * 5, 3, "TYPOS", "TYPOS")).collect();
        let result = process(raw_matches, &text, &ResultConfig::default());

        assert_eq!(result.matches.len(), 10);
        assert_eq!(result.summary.unwrap().total, 15);
    }
}
