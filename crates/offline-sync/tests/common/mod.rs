//! Shared fixtures for the worker integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use offline_sync::{
    cache_key, CacheStorage, CacheStore, CachedResponse, Deployment, Fetcher, HostSignals, MemoryStorage,
    OfflineWorker, Origin, ResourceManifest, ResourceRequest, ShellList, SyncError, SyncResult,
};

pub const ORIGIN: &str = "https://app.example.com";

pub const H0: &str = "00000000000000000000000000000000";
pub const H1: &str = "11111111111111111111111111111111";
pub const H2: &str = "22222222222222222222222222222222";
pub const H3: &str = "33333333333333333333333333333333";

pub fn url(key: &str) -> String {
    origin().resolve(key)
}

pub fn origin() -> Origin {
    Origin::parse(ORIGIN).unwrap()
}

pub fn deployment(resources: &[(&str, &str)], shell: &[&str]) -> Deployment {
    let manifest = ResourceManifest::new(
        resources
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
    .unwrap();
    Deployment::new(manifest, ShellList::new(shell.iter().copied())).unwrap()
}

/// Scripted network with per-URL responses and a call log.
///
/// Fragments never reach the server, so lookups ignore them.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, CachedResponse>>,
    calls: Mutex<Vec<ResourceRequest>>,
    offline: AtomicBool,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), CachedResponse::new(status, body));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ResourceRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &ResourceRequest) -> SyncResult<CachedResponse> {
        self.calls.lock().unwrap().push(request.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Network {
                message: "offline".to_string(),
            });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(cache_key(&request.url))
            .cloned()
            .unwrap_or_else(|| CachedResponse::new(404, "not found")))
    }
}

/// Memory storage whose `put` fails for one store once armed.
#[derive(Clone)]
pub struct FaultyStorage {
    inner: MemoryStorage,
    failing_store: String,
    armed: Arc<AtomicBool>,
}

impl FaultyStorage {
    pub fn new(inner: MemoryStorage, failing_store: &str) -> Self {
        Self {
            inner,
            failing_store: failing_store.to_string(),
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

struct FaultyStore {
    inner: Arc<dyn CacheStore>,
    fail: bool,
    armed: Arc<AtomicBool>,
}

#[async_trait]
impl CacheStore for FaultyStore {
    async fn get(&self, key: &str) -> SyncResult<Option<CachedResponse>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, response: &CachedResponse) -> SyncResult<()> {
        if self.fail && self.armed.load(Ordering::SeqCst) {
            return Err(SyncError::Store {
                message: format!("injected write failure for {}", key),
            });
        }
        self.inner.put(key, response).await
    }

    async fn delete(&self, key: &str) -> SyncResult<bool> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> SyncResult<Vec<String>> {
        self.inner.keys().await
    }
}

#[async_trait]
impl CacheStorage for FaultyStorage {
    async fn open(&self, name: &str) -> SyncResult<Arc<dyn CacheStore>> {
        let inner = self.inner.open(name).await?;
        let store: Arc<dyn CacheStore> = Arc::new(FaultyStore {
            inner,
            fail: name == self.failing_store,
            armed: self.armed.clone(),
        });
        Ok(store)
    }

    async fn delete(&self, name: &str) -> SyncResult<bool> {
        self.inner.delete(name).await
    }

    async fn has(&self, name: &str) -> SyncResult<bool> {
        self.inner.has(name).await
    }
}

/// A worker wired to shared in-memory storage and a stub network.
pub struct Harness {
    pub worker: OfflineWorker,
    pub storage: MemoryStorage,
    pub fetcher: Arc<StubFetcher>,
    pub host: Arc<HostSignals>,
}

impl Harness {
    pub fn new(deployment: Deployment) -> Self {
        Self::with_parts(deployment, MemoryStorage::new(), Arc::new(StubFetcher::new()))
    }

    pub fn with_parts(
        deployment: Deployment,
        storage: MemoryStorage,
        fetcher: Arc<StubFetcher>,
    ) -> Self {
        let host = Arc::new(HostSignals::new());
        let worker = OfflineWorker::new(
            deployment,
            origin(),
            Arc::new(storage.clone()),
            fetcher.clone(),
            host.clone(),
        );
        Self {
            worker,
            storage,
            fetcher,
            host,
        }
    }

    /// The next deployment: same storage and network, fresh worker.
    pub fn redeploy(&self, deployment: Deployment) -> Self {
        Self::with_parts(deployment, self.storage.clone(), self.fetcher.clone())
    }

    pub async fn content(&self) -> Arc<dyn CacheStore> {
        self.storage.open("content").await.unwrap()
    }

    pub async fn content_keys(&self) -> Vec<String> {
        self.content().await.keys().await.unwrap()
    }

    pub async fn content_body(&self, key: &str) -> Option<String> {
        self.content()
            .await
            .get(&url(key))
            .await
            .unwrap()
            .map(|r| String::from_utf8(r.body).unwrap())
    }

    /// Every content entry carries the fingerprint the persisted manifest names.
    pub async fn assert_consistent(&self) {
        let persisted = self
            .worker
            .persisted_manifest()
            .await
            .unwrap()
            .expect("manifest persisted");
        assert_eq!(&persisted, self.worker.manifest());
        for stored in self.content_keys().await {
            let key = origin().relative_key(&stored).unwrap();
            assert_eq!(
                persisted.fingerprint(&key),
                self.worker.manifest().fingerprint(&key),
                "stale entry survived activation: {}",
                stored
            );
            assert!(self.worker.manifest().contains(&key), "unknown entry: {}", stored);
        }
    }
}
