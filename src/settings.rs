//! User preferences and usage statistics
//!
//! `Settings` is the synced preference document and `Stats` the local usage
//! document. Both are plain key-value blobs; partial updates merge key-wise
//! with last-write-wins.

use crate::error::{Result, WriteRightError};
use crate::types::{CheckLevel, CheckOptions, IssueCategory, Provider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// How eagerly edited text is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckFrequency {
    Realtime,
    #[default]
    Delayed,
    /// Only explicit checks
    Manual,
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    pub grammar_check: bool,
    pub spell_check: bool,
    pub auto_correct: bool,
    pub language: String,
    pub check_frequency: CheckFrequency,
    pub error_color: String,
    pub suggestion_color: String,
    pub show_tooltip: bool,
    /// Percent, 0-100
    pub confidence_threshold: u8,
    /// Comma or newline separated host names
    pub excluded_sites: String,
    pub check_passwords: bool,
    pub show_notifications: bool,
    pub api_provider: Provider,
    pub max_text_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            grammar_check: true,
            spell_check: true,
            auto_correct: false,
            language: "en-US".to_string(),
            check_frequency: CheckFrequency::Delayed,
            error_color: "#ff4444".to_string(),
            suggestion_color: "#4444ff".to_string(),
            show_tooltip: true,
            confidence_threshold: 75,
            excluded_sites: String::new(),
            check_passwords: false,
            show_notifications: true,
            api_provider: Provider::LanguageTool,
            max_text_length: 10_000,
        }
    }
}

impl Settings {
    /// Overlay the keys of `partial` on top of these settings
    ///
    /// Unknown keys are ignored; a key with a value of the wrong type fails
    /// the whole merge.
    pub fn merged(&self, partial: &Value) -> Result<Settings> {
        let Value::Object(updates) = partial else {
            return Err(WriteRightError::InvalidInput(
                "settings must be a JSON object".to_string(),
            ));
        };

        let mut current = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut current {
            for (key, value) in updates {
                if fields.contains_key(key) {
                    fields.insert(key.clone(), value.clone());
                }
            }
        }

        serde_json::from_value(current)
            .map_err(|e| WriteRightError::InvalidInput(format!("invalid settings: {}", e)))
    }

    /// Check options derived from these preferences
    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            language: self.language.clone(),
            provider: self.api_provider,
            level: CheckLevel::Picky,
        }
    }

    /// Whether matches of this category should be shown
    pub fn allows(&self, category: IssueCategory) -> bool {
        match category {
            IssueCategory::Spelling => self.spell_check,
            _ => self.grammar_check,
        }
    }

    /// Whether `host` (or a parent domain of it) is excluded
    pub fn is_site_excluded(&self, host: &str) -> bool {
        let host = host.trim().to_lowercase();
        self.excluded_sites
            .split(|c: char| c == ',' || c == '\n')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .any(|site| host == site || host.ends_with(&format!(".{}", site)))
    }

    /// Debounce delay for automatic checks; `None` when checks are manual
    pub fn debounce_delay(&self, realtime_ms: u64, delayed_ms: u64) -> Option<Duration> {
        match self.check_frequency {
            CheckFrequency::Realtime => Some(Duration::from_millis(realtime_ms)),
            CheckFrequency::Delayed => Some(Duration::from_millis(delayed_ms)),
            CheckFrequency::Manual => None,
        }
    }
}

/// Usage counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub checks_performed: u64,
    pub errors_found: u64,
    pub suggestions_accepted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_date: Option<DateTime<Utc>>,
}

/// Increments applied to `Stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsDelta {
    pub checks_performed: u64,
    pub errors_found: u64,
    pub suggestions_accepted: u64,
}

impl StatsDelta {
    pub fn accepted() -> Self {
        Self {
            suggestions_accepted: 1,
            ..Default::default()
        }
    }

    pub fn check(errors_found: usize) -> Self {
        Self {
            checks_performed: 1,
            errors_found: errors_found as u64,
            ..Default::default()
        }
    }
}

impl Stats {
    pub fn apply(&mut self, delta: StatsDelta) {
        self.checks_performed = self.checks_performed.saturating_add(delta.checks_performed);
        self.errors_found = self.errors_found.saturating_add(delta.errors_found);
        self.suggestions_accepted = self
            .suggestions_accepted
            .saturating_add(delta.suggestions_accepted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_serialization_keys() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(value["grammarCheck"], json!(true));
        assert_eq!(value["apiProvider"], json!("languagetool"));
        assert_eq!(value["checkFrequency"], json!("delayed"));
        assert_eq!(value["maxTextLength"], json!(10_000));
    }

    #[test]
    fn test_merge_partial() {
        let settings = Settings::default();
        let merged = settings
            .merged(&json!({"language": "de-DE", "spellCheck": false, "bogus": 1}))
            .unwrap();

        assert_eq!(merged.language, "de-DE");
        assert!(!merged.spell_check);
        assert!(merged.grammar_check);
    }

    #[test]
    fn test_merge_rejects_bad_types() {
        let settings = Settings::default();
        assert!(settings.merged(&json!({"enabled": "yes"})).is_err());
        assert!(settings.merged(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_excluded_sites() {
        let settings = Settings {
            excluded_sites: "example.com,\n mail.google.com".to_string(),
            ..Default::default()
        };
        assert!(settings.is_site_excluded("example.com"));
        assert!(settings.is_site_excluded("docs.example.com"));
        assert!(settings.is_site_excluded("MAIL.google.com"));
        assert!(!settings.is_site_excluded("google.com"));
        assert!(!settings.is_site_excluded("notexample.com"));
    }

    #[test]
    fn test_category_filter() {
        let settings = Settings {
            spell_check: false,
            ..Default::default()
        };
        assert!(!settings.allows(IssueCategory::Spelling));
        assert!(settings.allows(IssueCategory::Grammar));
    }

    #[test]
    fn test_debounce_delay() {
        let mut settings = Settings::default();
        assert_eq!(settings.debounce_delay(400, 800), Some(Duration::from_millis(800)));
        settings.check_frequency = CheckFrequency::Realtime;
        assert_eq!(settings.debounce_delay(400, 800), Some(Duration::from_millis(400)));
        settings.check_frequency = CheckFrequency::Manual;
        assert_eq!(settings.debounce_delay(400, 800), None);
    }

    #[test]
    fn test_stats_apply() {
        let mut stats = Stats::default();
        stats.apply(StatsDelta::check(3));
        stats.apply(StatsDelta::accepted());
        assert_eq!(stats.checks_performed, 1);
        assert_eq!(stats.errors_found, 3);
        assert_eq!(stats.suggestions_accepted, 1);
    }
}
