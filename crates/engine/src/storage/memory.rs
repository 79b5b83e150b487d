//! In-memory [`StorageAdapter`] used by tests and by hosts that only need
//! session-scoped persistence. Mirrors the merge/omission/change-notification
//! semantics the engine expects from a real backing store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{ChangeListener, KeyChange, StorageAdapter, StorageChanges, StorageKey, Subscription};
use crate::errors::EngineError;

#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<StorageKey, Value>>,
    listeners: Arc<Mutex<Vec<(u64, ChangeListener)>>>,
    next_listener_id: AtomicU64,
}

impl MemoryStorage {
    /// Notifies listeners outside the data lock; a listener that re-enters
    /// storage must not deadlock.
    fn notify(&self, changes: StorageChanges) {
        if changes.is_empty() {
            return;
        }
        let snapshot: Vec<ChangeListener> = self
            .listeners
            .lock()
            .expect("listener registry poisoned")
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            listener(&changes);
        }
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get(&self, keys: &[StorageKey]) -> Result<HashMap<StorageKey, Value>, EngineError> {
        let data = self.data.lock().expect("storage poisoned");
        Ok(keys
            .iter()
            .filter_map(|k| data.get(k).map(|v| (*k, v.clone())))
            .collect())
    }

    async fn set(&self, entries: HashMap<StorageKey, Value>) -> Result<(), EngineError> {
        let mut changes = StorageChanges::new();
        {
            let mut data = self.data.lock().expect("storage poisoned");
            for (key, new) in entries {
                let old = data.insert(key, new.clone());
                if old.as_ref() != Some(&new) {
                    changes.insert(key, KeyChange { old, new: Some(new) });
                }
            }
        }
        self.notify(changes);
        Ok(())
    }

    async fn remove(&self, keys: &[StorageKey]) -> Result<(), EngineError> {
        let mut changes = StorageChanges::new();
        {
            let mut data = self.data.lock().expect("storage poisoned");
            for key in keys {
                if let Some(old) = data.remove(key) {
                    changes.insert(
                        *key,
                        KeyChange {
                            old: Some(old),
                            new: None,
                        },
                    );
                }
            }
        }
        self.notify(changes);
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let registry = self.listeners.clone();
        registry
            .lock()
            .expect("listener registry poisoned")
            .push((id, listener));
        Subscription::new(move || {
            registry
                .lock()
                .expect("listener registry poisoned")
                .retain(|(entry_id, _)| *entry_id != id);
        })
    }
}
