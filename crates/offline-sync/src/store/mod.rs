//! Named cache stores.
//!
//! The worker never touches a concrete cache; it opens stores by name through
//! [`CacheStorage`]. Two backends ship with the crate:
//!
//! - [`MemoryStorage`]: in-process, for tests and embedders
//! - [`FsStorage`]: one directory per store, durable across restarts
//!
//! A single `put` is atomic and same-key writes are last-writer-wins, so
//! concurrent requests need no further coordination.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;
use crate::types::CachedResponse;

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

/// Key→response mapping owned by one named store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> SyncResult<Option<CachedResponse>>;

    /// Insert or overwrite the entry for `key`.
    async fn put(&self, key: &str, response: &CachedResponse) -> SyncResult<()>;

    /// Remove `key`; returns whether it existed.
    async fn delete(&self, key: &str) -> SyncResult<bool>;

    /// All keys currently stored, sorted.
    async fn keys(&self) -> SyncResult<Vec<String>>;
}

/// Registry of named stores.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open (creating if needed) the store called `name`.
    async fn open(&self, name: &str) -> SyncResult<Arc<dyn CacheStore>>;

    /// Drop the store and all its entries; returns whether it existed.
    async fn delete(&self, name: &str) -> SyncResult<bool>;

    async fn has(&self, name: &str) -> SyncResult<bool>;
}

/// Names of the three stores the worker maintains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreNames {
    /// Holds the persisted manifest.
    #[serde(default = "default_manifest_store")]
    pub manifest: String,

    /// Holds shell resources between install and activate.
    #[serde(default = "default_staging_store")]
    pub staging: String,

    /// Holds the resources served to the application.
    #[serde(default = "default_content_store")]
    pub content: String,
}

fn default_manifest_store() -> String {
    "manifest-store".to_string()
}

fn default_staging_store() -> String {
    "shell-staging".to_string()
}

fn default_content_store() -> String {
    "content".to_string()
}

impl Default for StoreNames {
    fn default() -> Self {
        Self {
            manifest: default_manifest_store(),
            staging: default_staging_store(),
            content: default_content_store(),
        }
    }
}

impl StoreNames {
    pub fn all(&self) -> [&str; 3] {
        [&self.content, &self.staging, &self.manifest]
    }
}
