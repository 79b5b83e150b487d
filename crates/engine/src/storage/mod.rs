//! Persistence boundary.
//!
//! The engine never talks to a browser storage area directly; it consumes an
//! injected [`StorageAdapter`] with get/set/remove/subscribe semantics and
//! layers the typed key schema ([`StorageKey`]) on top via [`Storage`].
//! `set` merges — keys not included in a write are untouched.

pub mod keys;
pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::EngineError;
pub use keys::StorageKey;
pub use memory::MemoryStorage;

/// Old/new pair reported to change listeners. `None` means the key was
/// absent on that side of the transition.
#[derive(Debug, Clone)]
pub struct KeyChange {
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Per-key changes from a single committed write or removal.
pub type StorageChanges = HashMap<StorageKey, KeyChange>;

pub type ChangeListener = Arc<dyn Fn(&StorageChanges) + Send + Sync>;

/// Listener registration handle. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// The injected key-value persistence capability.
///
/// Contract: `get` reports missing keys by omission, never as an error;
/// `set` merges the partial mapping into existing state; listeners fire only
/// for keys that actually changed, with their old/new values.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn get(&self, keys: &[StorageKey]) -> Result<HashMap<StorageKey, Value>, EngineError>;
    async fn set(&self, entries: HashMap<StorageKey, Value>) -> Result<(), EngineError>;
    async fn remove(&self, keys: &[StorageKey]) -> Result<(), EngineError>;
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

/// Typed wrapper over an adapter: serde-encodes on write, decodes on read.
/// Malformed stored data surfaces as `EngineError::Validation` naming the key.
#[derive(Clone)]
pub struct Storage {
    adapter: Arc<dyn StorageAdapter>,
}

impl Storage {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Storage { adapter }
    }

    /// Reads and decodes one key. Absent and explicit-null both map to `None`.
    pub async fn read<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<T>, EngineError> {
        let mut values = self.adapter.get(&[key]).await?;
        match values.remove(&key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| EngineError::Validation(format!("stored '{key}' is malformed: {e}"))),
        }
    }

    /// Encodes and writes one key.
    pub async fn write<T: Serialize>(&self, key: StorageKey, value: &T) -> Result<(), EngineError> {
        let encoded = serde_json::to_value(value)
            .map_err(|e| EngineError::Validation(format!("cannot encode '{key}': {e}")))?;
        self.adapter.set(HashMap::from([(key, encoded)])).await
    }

    /// Writes several keys in one adapter call, so a listener observes them
    /// as a single consistent change set.
    pub async fn write_many(
        &self,
        entries: Vec<(StorageKey, Value)>,
    ) -> Result<(), EngineError> {
        self.adapter.set(entries.into_iter().collect()).await
    }

    pub async fn clear(&self, key: StorageKey) -> Result<(), EngineError> {
        self.adapter.remove(&[key]).await
    }

    pub fn subscribe(&self, listener: ChangeListener) -> Subscription {
        self.adapter.subscribe(listener)
    }

    /// Subscribes to changes of a single key, handing the listener the
    /// decoded new value (`None` on removal/null). Undecodable new values are
    /// logged and skipped rather than crashing the host's event dispatch.
    pub fn subscribe_key<T, F>(&self, key: StorageKey, on_change: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(Option<T>) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(move |changes: &StorageChanges| {
            let Some(change) = changes.get(&key) else {
                return;
            };
            match &change.new {
                None | Some(Value::Null) => on_change(None),
                Some(value) => match serde_json::from_value::<T>(value.clone()) {
                    Ok(decoded) => on_change(Some(decoded)),
                    Err(e) => tracing::warn!("ignoring malformed change for '{key}': {e}"),
                },
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_absent_key_is_none() {
        let storage = Storage::new(Arc::new(MemoryStorage::default()));
        let got: Option<u32> = storage.read(StorageKey::UsageCounter).await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_write_then_read_round_trips() {
        let storage = Storage::new(Arc::new(MemoryStorage::default()));
        storage.write(StorageKey::UsageCounter, &7u32).await.unwrap();
        let got: Option<u32> = storage.read(StorageKey::UsageCounter).await.unwrap();
        assert_eq!(got, Some(7));
    }

    #[tokio::test]
    async fn test_explicit_null_reads_as_none() {
        let storage = Storage::new(Arc::new(MemoryStorage::default()));
        storage
            .write(StorageKey::ActiveResumeId, &Option::<String>::None)
            .await
            .unwrap();
        let got: Option<String> = storage.read(StorageKey::ActiveResumeId).await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_malformed_stored_value_is_validation_error() {
        let storage = Storage::new(Arc::new(MemoryStorage::default()));
        storage
            .write(StorageKey::UsageCounter, &"not a number")
            .await
            .unwrap();
        let err = storage.read::<u32>(StorageKey::UsageCounter).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_subscribe_key_decodes_new_value() {
        use std::sync::Mutex;

        let storage = Storage::new(Arc::new(MemoryStorage::default()));
        let seen: Arc<Mutex<Vec<Option<u32>>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in = seen.clone();
        let _sub = storage.subscribe_key(StorageKey::UsageCounter, move |v: Option<u32>| {
            seen_in.lock().unwrap().push(v);
        });

        storage.write(StorageKey::UsageCounter, &3u32).await.unwrap();
        storage.clear(StorageKey::UsageCounter).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some(3), None]);
    }
}
