//! Grammar check pipeline
//!
//! `GrammarClient::check` runs validation, the request window, the result
//! cache and the selected backend, in that order. Transient backend failures
//! are retried with linear backoff; once attempts run out the offline rule
//! table answers instead (when enabled).

use super::cache::{CacheKey, ResultCache};
use super::fallback::FallbackMatcher;
use super::postprocess;
use super::rate_limiter::RateLimiter;
use crate::config::{ApiConfig, ResultConfig, WriteRightConfig};
use crate::error::{Result, WriteRightError};
use crate::types::{char_len, CheckOutcome, CheckRequest, CheckResult, Match, Provider, Summary};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Source of raw matches for a request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrammarBackend: Send + Sync {
    /// One attempt at checking `request`; offsets in chars of `request.text`
    async fn check(&self, request: &CheckRequest) -> Result<Vec<Match>>;
}

/// Rate-limited, cached grammar checker with offline fallback
pub struct GrammarClient {
    limiter: Arc<RateLimiter>,
    cache: Arc<ResultCache>,
    backend: Arc<dyn GrammarBackend>,
    fallback: FallbackMatcher,
    api: ApiConfig,
    results: ResultConfig,
}

impl GrammarClient {
    pub fn new(config: &WriteRightConfig, backend: Arc<dyn GrammarBackend>) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit.requests_per_minute,
                config.rate_limit.window(),
            )),
            cache: Arc::new(ResultCache::new(
                config.cache.duration(),
                config.cache.max_entries,
            )),
            backend,
            fallback: FallbackMatcher::new(config.results.fallback_max_matches),
            api: config.api.clone(),
            results: config.results.clone(),
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Check with the configured text length limit
    pub async fn check(&self, request: CheckRequest) -> Result<CheckOutcome> {
        self.check_with_limit(request, self.api.max_text_length).await
    }

    /// Check, rejecting text longer than `max_chars` (capped by the configured limit)
    pub async fn check_with_limit(
        &self,
        request: CheckRequest,
        max_chars: usize,
    ) -> Result<CheckOutcome> {
        validate(&request.text, max_chars.min(self.api.max_text_length))?;

        if !self.limiter.try_acquire() {
            let wait = self.limiter.wait_duration();
            debug!("Request window full, next slot in {:?}", wait);
            return Err(WriteRightError::RateLimited(wait));
        }

        let key = CacheKey::new(request.text.clone(), request.options.clone());
        if let Some(result) = self.cache.get(&key) {
            debug!("Cache hit for {} chars", char_len(&request.text));
            return Ok(CheckOutcome {
                result,
                cached: true,
            });
        }

        let result = match request.options.provider {
            Provider::Basic => {
                let matches = self.fallback.find(&request.text);
                CheckResult {
                    summary: Some(Summary::from_matches(&matches)),
                    matches,
                    fallback: false,
                }
            }
            Provider::LanguageTool => match self.call_with_retry(&request).await {
                Ok(raw) => postprocess::process(raw, &request.text, &self.results),
                Err(e) if self.api.enable_fallback => {
                    info!("Grammar service unavailable, using offline rules: {}", e);
                    return Ok(CheckOutcome {
                        result: Arc::new(self.fallback.check(&request.text)),
                        cached: false,
                    });
                }
                Err(e) => {
                    return Err(WriteRightError::UpstreamUnavailable(e.to_string()));
                }
            },
        };

        let result = Arc::new(result);
        self.cache.put(key, result.clone());
        Ok(CheckOutcome {
            result,
            cached: false,
        })
    }

    async fn call_with_retry(&self, request: &CheckRequest) -> Result<Vec<Match>> {
        let attempts = self.api.max_attempts.max(1);
        let mut last_error = WriteRightError::UpstreamUnavailable("no attempt made".to_string());

        for attempt in 1..=attempts {
            match timeout(self.api.timeout(), self.backend.check(request)).await {
                Ok(Ok(matches)) => return Ok(matches),
                Ok(Err(e)) => {
                    warn!("Grammar check attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        "Grammar check attempt {}/{} timed out after {:?}",
                        attempt,
                        attempts,
                        self.api.timeout()
                    );
                    last_error = WriteRightError::UpstreamUnavailable("request timed out".to_string());
                }
            }

            if attempt < attempts {
                sleep(self.api.retry_delay() * attempt).await;
            }
        }

        Err(last_error)
    }
}

fn validate(text: &str, max_chars: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(WriteRightError::InvalidInput("text is empty".to_string()));
    }
    let len = char_len(text);
    if len > max_chars {
        return Err(WriteRightError::InvalidInput(format!(
            "text is {} chars, limit is {}",
            len, max_chars
        )));
    }
    Ok(())
}
