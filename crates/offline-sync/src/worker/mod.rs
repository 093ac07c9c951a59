//! The offline worker: install, activate, intercept and message handling.
//!
//! All dependencies are handed over at construction, and every host event
//! goes through [`OfflineWorker::handle`]:
//!
//! ```text
//! Install  -> stage shell resources          (install.rs)
//! Activate -> reconcile caches with manifest (activate.rs)
//! Fetch    -> passthrough / cache / network  (intercept.rs)
//! Message  -> skipWaiting / downloadOffline  (messages.rs)
//! ```

use std::sync::Arc;

use futures::future::try_join_all;
use reqwest::header::CONTENT_TYPE;

use crate::error::{SyncError, SyncResult};
use crate::fetch::Fetcher;
use crate::host::HostControl;
use crate::key::Origin;
use crate::manifest::{Deployment, ResourceManifest};
use crate::store::{CacheStorage, CacheStore, StoreNames};
use crate::types::{CacheMode, CachedResponse, ResourceRequest};

mod activate;
mod install;
mod intercept;
mod messages;

pub use activate::ActivationReport;
pub use install::InstallReport;
pub use intercept::Interception;
pub use messages::{Command, DownloadReport};

/// Slot in the manifest store holding the last committed manifest.
pub const MANIFEST_KEY: &str = "manifest";

/// Slot holding the manifest being committed by an in-flight activation.
pub const PENDING_MANIFEST_KEY: &str = "manifest.pending";

/// Lifecycle events delivered by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(ResourceRequest),
    Message(String),
}

/// What the worker did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivationReport),
    /// Not ours; the host should use default network handling.
    Passthrough,
    Responded(CachedResponse),
    SkippedWaiting,
    Downloaded(DownloadReport),
    /// Unrecognised message.
    Ignored,
}

/// Keeps the content store consistent with one deployment's manifest.
pub struct OfflineWorker {
    deployment: Deployment,
    origin: Origin,
    stores: StoreNames,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    host: Arc<dyn HostControl>,
}

impl OfflineWorker {
    pub fn new(
        deployment: Deployment,
        origin: Origin,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn HostControl>,
    ) -> Self {
        Self {
            deployment,
            origin,
            stores: StoreNames::default(),
            storage,
            fetcher,
            host,
        }
    }

    pub fn with_store_names(mut self, stores: StoreNames) -> Self {
        self.stores = stores;
        self
    }

    pub fn manifest(&self) -> &ResourceManifest {
        &self.deployment.resources
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn store_names(&self) -> &StoreNames {
        &self.stores
    }

    /// Dispatch one host event.
    pub async fn handle(&self, event: LifecycleEvent) -> SyncResult<EventOutcome> {
        match event {
            LifecycleEvent::Install => self.install().await.map(EventOutcome::Installed),
            LifecycleEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            LifecycleEvent::Fetch(request) => Ok(match self.intercept(&request).await? {
                Interception::Passthrough => EventOutcome::Passthrough,
                Interception::Respond(response) => EventOutcome::Responded(response),
            }),
            LifecycleEvent::Message(message) => self.on_message(&message).await,
        }
    }

    /// Manifest committed by the last successful activation, if any.
    pub async fn persisted_manifest(&self) -> SyncResult<Option<ResourceManifest>> {
        let store = self.storage.open(&self.stores.manifest).await?;
        read_manifest(store.as_ref(), MANIFEST_KEY).await
    }

    async fn open_content(&self) -> SyncResult<Arc<dyn CacheStore>> {
        self.storage.open(&self.stores.content).await
    }

    /// Fetch every key, all-or-nothing: any transport failure or non-ok
    /// status fails the whole batch. Returns `(url, response)` pairs.
    async fn fetch_all(
        &self,
        keys: &[String],
        cache: CacheMode,
    ) -> SyncResult<Vec<(String, CachedResponse)>> {
        let fetches = keys.iter().map(|key| {
            let url = self.origin.resolve(key);
            let mut request = ResourceRequest::get(url.clone());
            request.cache = cache;
            async move {
                let response = self.fetcher.fetch(&request).await?;
                if !response.is_ok() {
                    return Err(SyncError::InvalidResponse {
                        message: format!("GET {} returned HTTP {}", url, response.status),
                    });
                }
                Ok((url, response))
            }
        });
        try_join_all(fetches).await
    }
}

async fn read_manifest(store: &dyn CacheStore, slot: &str) -> SyncResult<Option<ResourceManifest>> {
    match store.get(slot).await? {
        Some(response) => ResourceManifest::from_slice(&response.body).map(Some),
        None => Ok(None),
    }
}

fn manifest_response(manifest: &ResourceManifest) -> SyncResult<CachedResponse> {
    Ok(CachedResponse::new(200, manifest.to_json()?)
        .with_header(CONTENT_TYPE.as_str(), "application/json"))
}
