//! LanguageTool HTTP backend
//!
//! Sends one form-encoded request per call; retries, timeouts and the
//! offline fallback are the caller's concern. The API reports offsets in
//! UTF-16 code units, which are converted to char offsets here.

use super::grammar::GrammarBackend;
use crate::config::ApiConfig;
use crate::error::{Result, WriteRightError};
use crate::types::{CheckRequest, Match, Replacement, Rule, RuleCategory};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Rules that only flag whitespace noise
const DISABLED_RULES: &str = "WHITESPACE_RULE";

#[derive(Debug, Deserialize)]
struct LtResponse {
    #[serde(default)]
    matches: Vec<LtMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LtMatch {
    offset: usize,
    length: usize,
    #[serde(default)]
    message: String,
    #[serde(default)]
    short_message: String,
    #[serde(default)]
    replacements: Vec<LtReplacement>,
    #[serde(default)]
    rule: Option<LtRule>,
}

#[derive(Debug, Deserialize)]
struct LtReplacement {
    value: String,
}

#[derive(Debug, Deserialize)]
struct LtRule {
    #[serde(default)]
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<LtCategory>,
}

#[derive(Debug, Deserialize)]
struct LtCategory {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
}

/// Client for the free or premium LanguageTool endpoint
pub struct LanguageToolBackend {
    client: Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl LanguageToolBackend {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| WriteRightError::UpstreamUnavailable(e.to_string()))?;

        let credentials = match (&config.username, &config.api_key) {
            (Some(user), Some(key)) if config.has_api_key() => Some((user.clone(), key.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            endpoint: config.endpoint().to_string(),
            credentials,
        })
    }

    /// Point at a different endpoint (self-hosted server, test stub)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form<'a>(&'a self, request: &'a CheckRequest) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![
            ("text", request.text.as_str()),
            ("language", request.options.language.as_str()),
            ("enabledOnly", "false"),
            ("level", request.options.level.as_str()),
            ("disabledRules", DISABLED_RULES),
        ];
        if let Some((username, api_key)) = &self.credentials {
            form.push(("username", username.as_str()));
            form.push(("apiKey", api_key.as_str()));
        }
        form
    }
}

#[async_trait]
impl GrammarBackend for LanguageToolBackend {
    async fn check(&self, request: &CheckRequest) -> Result<Vec<Match>> {
        debug!(
            "Calling LanguageTool: {} chars, language {}",
            request.text.chars().count(),
            request.options.language
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .form(&self.form(request))
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let body: LtResponse = response.json().await?;
                debug!("LanguageTool returned {} matches", body.matches.len());
                Ok(convert_matches(body.matches, &request.text))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(WriteRightError::UpstreamUnavailable(
                "LanguageTool rate limit reached".to_string(),
            )),
            _ => {
                let detail = response.text().await.unwrap_or_default();
                Err(WriteRightError::UpstreamUnavailable(format!(
                    "HTTP {}: {}",
                    status,
                    detail.trim()
                )))
            }
        }
    }
}

/// Map UTF-16 code unit offsets to char offsets for `text`
struct Utf16Index {
    /// `starts[i]` is the UTF-16 offset of char `i`; one extra entry for the end
    starts: Vec<usize>,
}

impl Utf16Index {
    fn new(text: &str) -> Self {
        let mut starts = Vec::with_capacity(text.len() + 1);
        let mut unit = 0;
        for c in text.chars() {
            starts.push(unit);
            unit += c.len_utf16();
        }
        starts.push(unit);
        Self { starts }
    }

    /// Char index at or after the given UTF-16 offset, clamped to the text end
    fn to_char(&self, utf16: usize) -> usize {
        let chars = self.starts.len() - 1;
        self.starts.partition_point(|&start| start < utf16).min(chars)
    }
}

fn convert_matches(raw: Vec<LtMatch>, text: &str) -> Vec<Match> {
    let index = Utf16Index::new(text);

    raw.into_iter()
        .map(|m| {
            let start = index.to_char(m.offset);
            let end = index.to_char(m.offset.saturating_add(m.length));
            let rule = m.rule.map(|r| Rule {
                id: r.id,
                description: r.description,
                category: r
                    .category
                    .map(|c| RuleCategory { id: c.id, name: c.name })
                    .unwrap_or_default(),
            });

            Match {
                offset: start,
                length: end.saturating_sub(start),
                message: m.message,
                short_message: m.short_message,
                replacements: m
                    .replacements
                    .into_iter()
                    .map(|r| Replacement { value: r.value })
                    .collect(),
                rule: rule.unwrap_or_default(),
                severity: Default::default(),
                category: Default::default(),
                confidence: 0.0,
                preview: None,
            }
        })
        .collect()
}
