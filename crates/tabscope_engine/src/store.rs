//! Session-scoped key/value storage.
//!
//! Contents survive a restart of the background process but not of the
//! browser. Every access is a suspension point.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tabscope_core::StateKey;
use tabscope_logging::{ts_error, ts_warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session directory missing or not writable: {0}")]
    SessionDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    /// Removes the given keys. Missing keys are not an error.
    async fn remove(&self, keys: &[String]) -> Result<(), StoreError>;
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Process-lifetime store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut entries = self.entries();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries().keys().cloned().collect())
    }
}

/// Typed, best-effort access to per-tab records.
///
/// Failures are logged and swallowed: a lost read looks like missing state and
/// a lost write is simply not persisted.
#[derive(Clone)]
pub struct SessionRecords {
    store: Arc<dyn SessionStore>,
}

impl SessionRecords {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn load<T: DeserializeOwned>(&self, key: StateKey) -> Option<T> {
        let raw = match self.store.get(&key.to_string()).await {
            Ok(raw) => raw?,
            Err(err) => {
                ts_error!("[store] failed to load {}: {}", key, err);
                return None;
            }
        };
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                ts_warn!("[store] discarding malformed record {}: {}", key, err);
                None
            }
        }
    }

    pub async fn save<T: Serialize>(&self, key: StateKey, value: &T) {
        if let Err(err) = self.try_save(key, value).await {
            ts_error!("[store] failed to save {}: {}", key, err);
        }
    }

    /// Like [`SessionRecords::save`], but hands the failure to the caller.
    pub async fn try_save<T: Serialize>(&self, key: StateKey, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_value(value)?;
        self.store.set(&key.to_string(), raw).await
    }

    pub async fn remove(&self, keys: &[StateKey]) {
        let raw: Vec<String> = keys.iter().map(ToString::to_string).collect();
        if let Err(err) = self.store.remove(&raw).await {
            ts_error!("[store] failed to remove {:?}: {}", raw, err);
        }
    }
}
