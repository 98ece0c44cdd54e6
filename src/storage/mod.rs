//! Persisted state for WriteRight
//!
//! Two logical documents are kept: the synced settings blob and the local
//! stats blob. Both sit on a [`DocumentStore`], a single-document key-value
//! backend, so the same code runs against JSON files or memory.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{Result, WriteRightError};
use crate::settings::{Settings, Stats, StatsDelta};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Backend holding one JSON document
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the document; `None` when it was never written
    async fn load(&self) -> Result<Option<Value>>;

    /// Replace the document
    async fn save(&self, document: &Value) -> Result<()>;
}

/// Synced user preferences
pub struct SettingsStore {
    backend: Arc<dyn DocumentStore>,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// Stored settings merged over the defaults
    pub async fn load(&self) -> Result<Settings> {
        match self.backend.load().await? {
            Some(document) => Settings::default().merged(&document).map_err(|e| {
                WriteRightError::StorageFailure(format!("corrupt settings document: {}", e))
            }),
            None => Ok(Settings::default()),
        }
    }

    /// Like [`load`](Self::load), but falls back to defaults on failure
    pub async fn load_or_default(&self) -> Settings {
        match self.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Settings unavailable, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Merge `partial` over the stored settings and persist the result
    pub async fn save(&self, partial: &Value) -> Result<Settings> {
        let _guard = self.write_lock.lock().await;
        let current = self.load().await?;
        let updated = current.merged(partial)?;
        self.backend.save(&serde_json::to_value(&updated)?).await?;
        debug!("Settings saved");
        Ok(updated)
    }

    /// Write the defaults when nothing is stored yet
    pub async fn initialize(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.backend.load().await?.is_some() {
            return Ok(false);
        }
        self.backend
            .save(&serde_json::to_value(Settings::default())?)
            .await?;
        Ok(true)
    }
}

/// Local usage counters
pub struct StatsStore {
    backend: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl StatsStore {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Result<Stats> {
        match self.backend.load().await? {
            Some(document) => serde_json::from_value(document).map_err(|e| {
                WriteRightError::StorageFailure(format!("corrupt stats document: {}", e))
            }),
            None => Ok(Stats::default()),
        }
    }

    /// Add `delta` to the stored counters
    pub async fn update(&self, delta: StatsDelta) -> Result<Stats> {
        let _guard = self.write_lock.lock().await;
        let mut stats = self.load().await?;
        stats.apply(delta);
        self.backend.save(&serde_json::to_value(&stats)?).await?;
        Ok(stats)
    }

    /// Record the install date if none is stored
    pub async fn initialize(&self) -> Result<Stats> {
        let _guard = self.write_lock.lock().await;
        let mut stats = self.load().await?;
        if stats.install_date.is_none() {
            stats.install_date = Some(Utc::now());
            self.backend.save(&serde_json::to_value(&stats)?).await?;
        }
        Ok(stats)
    }
}
