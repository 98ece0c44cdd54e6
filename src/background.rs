//! Background service
//!
//! The single owner of shared state: grammar client (with its cache and
//! request window), persisted settings and stats. Hosts construct one
//! instance and share it behind an `Arc`.

use crate::config::WriteRightConfig;
use crate::error::Result;
use crate::services::{GrammarBackend, GrammarClient, LanguageToolBackend, ResultCache};
use crate::settings::{Settings, Stats, StatsDelta};
use crate::storage::{DocumentStore, JsonFileStore, SettingsStore, StatsStore};
use crate::types::{CheckOutcome, CheckRequest, CheckResult, OptionOverrides, Summary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Liveness snapshot returned by `checkHealth`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub cache_size: usize,
    pub requests_in_window: u32,
    pub rate_limit: u32,
    pub uptime_secs: u64,
    pub version: String,
}

pub struct BackgroundService {
    client: GrammarClient,
    settings: SettingsStore,
    stats: StatsStore,
    config: WriteRightConfig,
    started_at: Instant,
    sweeper: Mutex<Option<CancellationToken>>,
}

impl BackgroundService {
    pub fn new(
        config: WriteRightConfig,
        backend: Arc<dyn GrammarBackend>,
        settings_store: Arc<dyn DocumentStore>,
        stats_store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            client: GrammarClient::new(&config, backend),
            settings: SettingsStore::new(settings_store),
            stats: StatsStore::new(stats_store),
            config,
            started_at: Instant::now(),
            sweeper: Mutex::new(None),
        }
    }

    /// LanguageTool backend with JSON files in the configured data directory
    pub fn from_config(config: WriteRightConfig) -> Result<Self> {
        let backend = LanguageToolBackend::new(&config.api)?;
        let data_dir = config.storage.data_dir();
        debug!("Using data directory {}", data_dir.display());

        Ok(Self::new(
            config,
            Arc::new(backend),
            Arc::new(JsonFileStore::new(data_dir.join("settings.json"))),
            Arc::new(JsonFileStore::new(data_dir.join("stats.json"))),
        ))
    }

    pub fn config(&self) -> &WriteRightConfig {
        &self.config
    }

    /// First-run setup: default settings and the install date
    pub async fn install(&self) -> Result<()> {
        if self.settings.initialize().await? {
            info!("Initialized default settings");
        }
        self.stats.initialize().await?;
        Ok(())
    }

    /// Check `text` with the stored settings plus `overrides`
    pub async fn check_grammar(
        &self,
        text: String,
        overrides: OptionOverrides,
    ) -> Result<CheckOutcome> {
        let settings = self.settings.load_or_default().await;

        let mut options = settings.check_options();
        if let Some(language) = overrides.language {
            options.language = language;
        }
        if let Some(provider) = overrides.provider {
            options.provider = provider;
        }
        if let Some(level) = overrides.level {
            options.level = level;
        }

        let outcome = self
            .client
            .check_with_limit(CheckRequest::new(text, options), settings.max_text_length)
            .await?;
        let outcome = filter_categories(outcome, &settings);

        if !outcome.cached {
            let delta = StatsDelta::check(outcome.result.matches.len());
            if let Err(e) = self.stats.update(delta).await {
                warn!("Failed to record check stats: {}", e);
            }
        }

        Ok(outcome)
    }

    pub async fn settings(&self) -> Result<Settings> {
        self.settings.load().await
    }

    /// Merge `partial` into the stored settings
    pub async fn save_settings(&self, partial: &Value) -> Result<Settings> {
        self.settings.save(partial).await
    }

    /// Flip `enabled`, returning the new state
    pub async fn toggle(&self) -> Result<bool> {
        let current = self.settings.load_or_default().await;
        let enabled = !current.enabled;
        self.settings
            .save(&serde_json::json!({ "enabled": enabled }))
            .await?;
        info!("WriteRight {}", if enabled { "enabled" } else { "disabled" });
        Ok(enabled)
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.stats.load().await
    }

    pub async fn update_stats(&self, delta: StatsDelta) -> Result<Stats> {
        self.stats.update(delta).await
    }

    pub fn clear_cache(&self) {
        self.client.cache().clear();
        info!("Result cache cleared");
    }

    /// Log an error reported by the editor side; returns a report id
    pub fn report_error(&self, report: &Value) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let message = report
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error");
        error!(report_id = %id, context = %report, "Editor reported error: {}", message);
        id
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_string(),
            cache_size: self.client.cache().len(),
            requests_in_window: self.client.limiter().requests_in_window(),
            rate_limit: self.client.limiter().limit(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Spawn the periodic cache sweep; a no-op if already running
    pub fn start_sweeper(&self) {
        let mut slot = self
            .sweeper
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let cache: Arc<ResultCache> = self.client.cache().clone();
        let period = self.config.cache.sweep_interval();
        let stop = token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        cache.sweep();
                    }
                }
            }
            debug!("Cache sweeper stopped");
        });

        *slot = Some(token);
    }

    pub fn stop_sweeper(&self) {
        let token = self
            .sweeper
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }
}

impl Drop for BackgroundService {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

/// Drop categories the user switched off
fn filter_categories(outcome: CheckOutcome, settings: &Settings) -> CheckOutcome {
    if settings.spell_check && settings.grammar_check {
        return outcome;
    }

    let matches: Vec<_> = outcome
        .result
        .matches
        .iter()
        .filter(|m| settings.allows(m.category))
        .cloned()
        .collect();

    let result = CheckResult {
        summary: outcome
            .result
            .summary
            .as_ref()
            .map(|_| Summary::from_matches(&matches)),
        matches,
        fallback: outcome.result.fallback,
    };

    CheckOutcome {
        result: Arc::new(result),
        cached: outcome.cached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteRightError;
    use crate::services::grammar::MockGrammarBackend;
    use crate::storage::MemoryStore;
    use crate::types::{IssueCategory, Match, Provider, Rule, RuleCategory, Severity};
    use serde_json::json;
    use std::time::Duration;

    fn api_match(offset: usize, rule_id: &str, category_id: &str) -> Match {
        Match {
            offset,
            length: 3,
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
            severity: Severity::Info,
            category: IssueCategory::Other,
            confidence: 0.0,
            preview: None,
        }
    }

    fn service(backend: MockGrammarBackend) -> BackgroundService {
        BackgroundService::new(
            WriteRightConfig::default(),
            Arc::new(backend),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let service = service(MockGrammarBackend::new());
        service.install().await.unwrap();
        service.save_settings(&json!({"language": "fr"})).await.unwrap();
        let first = service.stats().await.unwrap().install_date;

        service.install().await.unwrap();
        assert_eq!(service.settings().await.unwrap().language, "fr");
        assert_eq!(service.stats().await.unwrap().install_date, first);
    }

    #[tokio::test]
    async fn test_stats_only_for_fresh_checks() {
        let mut backend = MockGrammarBackend::new();
        backend
            .expect_check()
            .times(1)
            .returning(|_| Ok(vec![api_match(2, "MORFOLOGIK_RULE_EN_US", "TYPOS")]));
        let service = service(backend);

        let first = service
            .check_grammar("I teh best".to_string(), OptionOverrides::default())
            .await
            .unwrap();
        let second = service
            .check_grammar("I teh best".to_string(), OptionOverrides::default())
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(first.result.matches.len(), 1);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.checks_performed, 1);
        assert_eq!(stats.errors_found, 1);
    }

    #[tokio::test]
    async fn test_disabled_spell_check_filters_spelling() {
        let mut backend = MockGrammarBackend::new();
        backend.expect_check().returning(|_| {
            Ok(vec![
                api_match(0, "MORFOLOGIK_RULE_EN_US", "TYPOS"),
                api_match(6, "AGREEMENT", "GRAMMAR"),
            ])
        });
        let service = service(backend);
        service
            .save_settings(&json!({"spellCheck": false}))
            .await
            .unwrap();

        let outcome = service
            .check_grammar("Thsi are wrong".to_string(), OptionOverrides::default())
            .await
            .unwrap();
        assert_eq!(outcome.result.matches.len(), 1);
        assert_eq!(outcome.result.matches[0].category, IssueCategory::Grammar);
        assert_eq!(outcome.result.summary.as_ref().unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_settings_length_limit_applies() {
        let mut backend = MockGrammarBackend::new();
        backend.expect_check().times(0);
        let service = service(backend);
        service
            .save_settings(&json!({"maxTextLength": 5}))
            .await
            .unwrap();

        let err = service
            .check_grammar("longer than five".to_string(), OptionOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WriteRightError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_overrides_select_provider() {
        let mut backend = MockGrammarBackend::new();
        backend.expect_check().times(0);
        let service = service(backend);

        let overrides = OptionOverrides {
            provider: Some(Provider::Basic),
            ..Default::default()
        };
        let outcome = service
            .check_grammar("I teh best".to_string(), overrides)
            .await
            .unwrap();
        assert_eq!(outcome.result.matches[0].best_replacement(), Some("the"));
    }

    #[tokio::test]
    async fn test_check_survives_settings_failure() {
        let mut backend = MockGrammarBackend::new();
        backend.expect_check().returning(|_| Ok(vec![]));
        let service = BackgroundService::new(
            WriteRightConfig::default(),
            Arc::new(backend),
            Arc::new(MemoryStore::failing()),
            Arc::new(MemoryStore::failing()),
        );

        let outcome = service
            .check_grammar("Fine text".to_string(), OptionOverrides::default())
            .await
            .unwrap();
        assert!(outcome.result.matches.is_empty());
        assert!(matches!(
            service.settings().await,
            Err(WriteRightError::StorageFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_flips_enabled() {
        let service = service(MockGrammarBackend::new());
        assert!(!service.toggle().await.unwrap());
        assert!(!service.settings().await.unwrap().enabled);
        assert!(service.toggle().await.unwrap());
    }

    #[tokio::test]
    async fn test_health_and_clear_cache() {
        let mut backend = MockGrammarBackend::new();
        backend.expect_check().returning(|_| Ok(vec![]));
        let service = service(backend);
        service
            .check_grammar("Some text".to_string(), OptionOverrides::default())
            .await
            .unwrap();

        let health = service.health();
        assert_eq!(health.cache_size, 1);
        assert_eq!(health.requests_in_window, 1);
        assert_eq!(health.rate_limit, 20);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));

        service.clear_cache();
        assert_eq!(service.health().cache_size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_stale_entries() {
        let mut backend = MockGrammarBackend::new();
        backend.expect_check().returning(|_| Ok(vec![]));
        let service = service(backend);
        service
            .check_grammar("Some text".to_string(), OptionOverrides::default())
            .await
            .unwrap();

        service.start_sweeper();
        tokio::time::sleep(Duration::from_secs(301)).await;
        // Let the sweep tick run
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.health().cache_size, 0);
        service.stop_sweeper();
    }

    #[test]
    fn test_report_error_returns_id() {
        let service = service(MockGrammarBackend::new());
        let id = service.report_error(&json!({"message": "boom", "url": "https://example.com"}));
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
