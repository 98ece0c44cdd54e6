//! Result cache for grammar checks

use crate::types::{CheckOptions, CheckResult};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Exact text plus the options it was checked with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub options: CheckOptions,
}

impl CacheKey {
    pub fn new(text: impl Into<String>, options: CheckOptions) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }
}

/// Cached check result
#[derive(Debug, Clone)]
struct CachedEntry {
    result: Arc<CheckResult>,
    created_at: Instant,
}

impl CachedEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) < ttl
    }
}

/// TTL cache of check results, capped in size with LRU eviction
pub struct ResultCache {
    entries: Mutex<LruCache<CacheKey, CachedEntry>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Fresh result for `key`; stale entries are left for the sweeper
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CheckResult>> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<Arc<CheckResult>> {
        let mut entries = self.lock();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.result.clone())
    }

    pub fn put(&self, key: CacheKey, result: Arc<CheckResult>) {
        let entry = CachedEntry {
            result,
            created_at: Instant::now(),
        };
        self.lock().put(key, entry);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop every stale entry, returning how many were removed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();

        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(now, self.ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            entries.pop(key);
        }

        if !stale.is_empty() {
            debug!("Swept {} stale cache entries", stale.len());
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, CachedEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
