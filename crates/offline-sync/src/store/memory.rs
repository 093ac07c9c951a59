//! In-process cache storage.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::SyncResult;
use crate::types::CachedResponse;

use super::{CacheStorage, CacheStore};

/// Stores kept in memory for the lifetime of the value.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    stores: Arc<Mutex<HashMap<String, Arc<MemoryStore>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the stores that currently exist, sorted.
    pub async fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> SyncResult<Arc<dyn CacheStore>> {
        let mut stores = self.stores.lock().await;
        let store: Arc<dyn CacheStore> = stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::default()))
            .clone();
        Ok(store)
    }

    async fn delete(&self, name: &str) -> SyncResult<bool> {
        Ok(self.stores.lock().await.remove(name).is_some())
    }

    async fn has(&self, name: &str) -> SyncResult<bool> {
        Ok(self.stores.lock().await.contains_key(name))
    }
}

/// A single in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, CachedResponse>>,
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> SyncResult<Option<CachedResponse>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, response: &CachedResponse) -> SyncResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), response.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> SyncResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn keys(&self) -> SyncResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}
