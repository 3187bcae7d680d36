use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tabscope_core::{StateKey, StateKind, TabId};

use crate::store::{SessionRecords, StoreError};

/// Write-through cache of one kind of per-tab record.
///
/// The session store stays the source of truth; the in-memory map only saves
/// redundant reads and is dropped whenever the stored key goes away.
pub struct TabRecordCache<T> {
    kind: StateKind,
    records: SessionRecords,
    entries: Mutex<HashMap<TabId, T>>,
}

impl<T> TabRecordCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(kind: StateKind, records: SessionRecords) -> Self {
        Self {
            kind,
            records,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(&self, tab_id: TabId) -> StateKey {
        StateKey::new(self.kind, tab_id)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<TabId, T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached record, falling back to the store on a miss.
    pub async fn load(&self, tab_id: TabId) -> Option<T> {
        let hit = self.entries().get(&tab_id).cloned();
        if hit.is_some() {
            return hit;
        }
        self.load_fresh(tab_id).await
    }

    /// Reads the store, bypassing the cache, and refreshes the cache with the result.
    pub async fn load_fresh(&self, tab_id: TabId) -> Option<T> {
        let loaded: Option<T> = self.records.load(self.key(tab_id)).await;
        let mut entries = self.entries();
        match &loaded {
            Some(value) => {
                entries.insert(tab_id, value.clone());
            }
            None => {
                entries.remove(&tab_id);
            }
        }
        loaded
    }

    pub async fn store(&self, tab_id: TabId, value: &T) {
        self.entries().insert(tab_id, value.clone());
        self.records.save(self.key(tab_id), value).await;
    }

    /// Writes to the store first and caches only once the write succeeded.
    pub async fn try_store(&self, tab_id: TabId, value: &T) -> Result<(), StoreError> {
        self.records.try_save(self.key(tab_id), value).await?;
        self.entries().insert(tab_id, value.clone());
        Ok(())
    }

    /// Drops the in-memory copy only.
    pub fn forget(&self, tab_id: TabId) {
        self.entries().remove(&tab_id);
    }

    pub fn forget_all(&self) {
        self.entries().clear();
    }
}
