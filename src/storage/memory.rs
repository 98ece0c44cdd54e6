//! In-memory document store

use super::DocumentStore;
use crate::error::{Result, WriteRightError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::RwLock;

/// Document held in process memory; lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: RwLock<Option<Value>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an initial document
    pub fn with_document(document: Value) -> Self {
        Self {
            document: RwLock::new(Some(document)),
            fail: false,
        }
    }

    /// Store whose every operation fails, for exercising degraded paths
    pub fn failing() -> Self {
        Self {
            document: RwLock::new(None),
            fail: true,
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(WriteRightError::StorageFailure(
                "store unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self) -> Result<Option<Value>> {
        self.check()?;
        let document = self
            .document
            .read()
            .map_err(|e| WriteRightError::StorageFailure(e.to_string()))?;
        Ok(document.clone())
    }

    async fn save(&self, document: &Value) -> Result<()> {
        self.check()?;
        let mut slot = self
            .document
            .write()
            .map_err(|e| WriteRightError::StorageFailure(e.to_string()))?;
        *slot = Some(document.clone());
        Ok(())
    }
}
