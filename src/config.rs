//! Configuration for WriteRight
//!
//! Settings are layered from built-in defaults, an optional TOML file and
//! `WRITERIGHT_*` environment variables (sections separated by `__`, e.g.
//! `WRITERIGHT_RATE_LIMIT__REQUESTS_PER_MINUTE=40`).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Free LanguageTool endpoint (rate limited upstream to 20 requests/minute)
pub const FREE_ENDPOINT: &str = "https://api.languagetool.org/v2/check";

/// Premium LanguageTool endpoint (requires an API key)
pub const PREMIUM_ENDPOINT: &str = "https://api.languagetoolplus.com/v2/check";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteRightConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub results: ResultConfig,
    pub editor: EditorConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

impl WriteRightConfig {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        } else if let Some(default_path) = default_config_path() {
            builder = builder.add_source(config::File::from(default_path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("WRITERIGHT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut config: WriteRightConfig = settings.try_deserialize()?;
        config.api.resolve_api_key();
        Ok(config)
    }
}

/// `~/.config/writeright/config.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("writeright").join("config.toml"))
}

/// Grammar API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub free_endpoint: String,
    pub premium_endpoint: String,
    /// Premium API key; empty means free tier
    pub api_key: Option<String>,
    /// Account name paired with the premium API key
    pub username: Option<String>,
    pub timeout_ms: u64,
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// Linear backoff step between attempts
    pub retry_delay_ms: u64,
    /// Answer from the local rule table when the API stays unreachable
    pub enable_fallback: bool,
    /// Longest text, in chars, accepted for checking
    pub max_text_length: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            free_endpoint: FREE_ENDPOINT.to_string(),
            premium_endpoint: PREMIUM_ENDPOINT.to_string(),
            api_key: None,
            username: None,
            timeout_ms: 5000,
            max_attempts: 2,
            retry_delay_ms: 1000,
            enable_fallback: true,
            max_text_length: 10_000,
        }
    }
}

impl ApiConfig {
    /// Fill the API key from `LANGUAGETOOL_API_KEY` when not configured
    fn resolve_api_key(&mut self) {
        let missing = self.api_key.as_deref().map_or(true, str::is_empty);
        if missing {
            if let Ok(key) = env::var("LANGUAGETOOL_API_KEY") {
                if !key.is_empty() {
                    debug!("Using API key from LANGUAGETOOL_API_KEY environment variable");
                    self.api_key = Some(key);
                }
            }
        }
    }

    /// Premium endpoint when an API key is present, free endpoint otherwise
    pub fn endpoint(&self) -> &str {
        if self.has_api_key() {
            &self.premium_endpoint
        } else {
            &self.free_endpoint
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub duration_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            duration_secs: 300,
            sweep_interval_secs: 60,
            max_entries: 500,
        }
    }
}

impl CacheConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Outbound request window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 20,
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Post-processing of API matches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultConfig {
    /// Matches spanning this many chars or more are dropped
    pub max_match_length: usize,
    /// Matches at or below this confidence are dropped
    pub confidence_floor: f32,
    pub max_matches: usize,
    pub fallback_max_matches: usize,
    /// Chars of context on each side of a preview
    pub preview_context: usize,
}

impl Default for ResultConfig {
    fn default() -> Self {
        Self {
            max_match_length: 50,
            confidence_floor: 0.3,
            max_matches: 10,
            fallback_max_matches: 5,
            preview_context: 20,
        }
    }
}

/// Content-side behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Debounce for `checkFrequency = realtime`
    pub realtime_debounce_ms: u64,
    /// Debounce for `checkFrequency = delayed`
    pub delayed_debounce_ms: u64,
    pub rescan_interval_secs: u64,
    /// Shorter text clears decorations instead of being checked
    pub min_text_chars: usize,
    pub min_width: f32,
    pub min_height: f32,
    pub max_popup_suggestions: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            realtime_debounce_ms: 400,
            delayed_debounce_ms: 800,
            rescan_interval_secs: 5,
            min_text_chars: 3,
            min_width: 50.0,
            min_height: 20.0,
            max_popup_suggestions: 5,
        }
    }
}

impl EditorConfig {
    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.rescan_interval_secs.max(1))
    }
}

/// Message transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 3000).into(),
        }
    }
}

/// Persisted settings and stats location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured directory or `<data_local_dir>/writeright`
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("writeright")
        })
    }
}
