//! Keyed debouncing on tokio tasks
//!
//! Scheduling a task for a key replaces whatever was pending for that key,
//! so only the most recent call fires. Once a task starts running it is no
//! longer pending and later schedules do not touch it.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

type PendingMap<K> = Arc<Mutex<HashMap<K, Pending>>>;

pub struct Debouncer<K> {
    pending: PendingMap<K>,
    generation: AtomicU64,
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Run `task` after `delay` unless `key` is scheduled or cancelled again first
    pub fn schedule<F, Fut>(&self, key: K, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let pending = self.pending.clone();
        let task_key = key.clone();

        // Held across the spawn so the task cannot claim its slot before it exists
        let mut slots = lock(&self.pending);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slots = lock(&pending);
                match slots.get(&task_key) {
                    Some(slot) if slot.generation == generation => {
                        slots.remove(&task_key);
                    }
                    _ => return,
                }
            }
            task().await;
        });

        if let Some(previous) = slots.insert(key, Pending { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Drop the pending call for `key`; returns whether one was pending
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.pending).remove(key) {
            Some(slot) => {
                slot.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, slot) in lock(&self.pending).drain() {
            slot.handle.abort();
        }
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.pending).contains_key(key)
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        let mut slots = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (_, slot) in slots.drain() {
            slot.handle.abort();
        }
    }
}

fn lock<K>(pending: &Mutex<HashMap<K, Pending>>) -> MutexGuard<'_, HashMap<K, Pending>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
