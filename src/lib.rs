//! WriteRight - grammar and spelling assistance for editable text
//!
//! Provides:
//! - A rate-limited, cached LanguageTool client with an offline fallback
//! - Persisted settings and usage statistics
//! - An action-based message router (with HTTP transport)
//! - The editor side: field discovery, debounced checks, highlights and
//!   in-place suggestion edits
//!
//! # Architecture
//!
//! - **Types**: matches, requests and results
//! - **Services**: grammar client, result cache, rate limiter, fallback rules
//! - **Storage**: JSON documents for settings and stats
//! - **Background**: the single owner of shared state
//! - **API**: message router, menu actions and the HTTP server
//! - **Editor**: per-document session talking to the background
//!
//! # Example
//!
//! ```ignore
//! use writeright_core::{BackgroundService, MessageRouter, WriteRightConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = WriteRightConfig::load(None)?;
//!     let service = Arc::new(BackgroundService::from_config(config)?);
//!     service.install().await?;
//!
//!     let router = MessageRouter::new(service);
//!     let response = router
//!         .dispatch("checkGrammar", serde_json::json!({"text": "I teh best"}))
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod background;
pub mod config;
pub mod editor;
pub mod error;
pub mod services;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use api::{ApiServer, MenuAction, MessageRouter, Request, Response};
pub use background::{BackgroundService, HealthReport};
pub use config::WriteRightConfig;
pub use editor::{BackgroundClient, DocumentHost, EditorSession, ElementId};
pub use error::{ErrorKind, Result, WriteRightError};
pub use services::{GrammarBackend, GrammarClient, LanguageToolBackend};
pub use settings::{Settings, Stats, StatsDelta};
pub use storage::{DocumentStore, JsonFileStore, MemoryStore};
pub use types::{
    CheckLevel, CheckOptions, CheckOutcome, CheckRequest, CheckResult, IssueCategory, Match,
    OptionOverrides, Provider, Severity, Summary,
};
