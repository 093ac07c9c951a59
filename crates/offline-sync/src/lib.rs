//! Versioned offline-cache synchronizer for packaged web applications.
//!
//! Keeps one content cache consistent with one resource manifest across
//! deployments:
//!
//! - Install: stage the shell resources with cache bypass
//! - Activate: diff the new manifest against the persisted one, evict stale
//!   entries, refresh the shell, persist the manifest (full reset on fault)
//! - Fetch: online-first for the root document, cache-first for other
//!   versioned resources, passthrough for everything else
//! - Messages: `skipWaiting`, `downloadOffline`
//!
//! Cache storage, network and host runtime are injected, so the whole
//! lifecycle runs without a browser.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use offline_sync::{
//!     Deployment, FsStorage, HostSignals, HttpFetcher, LifecycleEvent, OfflineWorker,
//!     ResourceRequest, SyncConfig,
//! };
//!
//! # async fn example() -> offline_sync::SyncResult<()> {
//! let config = SyncConfig::from_env();
//! let deployment = Deployment::load("deployment.json".as_ref()).await?;
//!
//! let worker = OfflineWorker::new(
//!     deployment,
//!     config.parsed_origin()?,
//!     Arc::new(FsStorage::new(&config.cache_dir)),
//!     Arc::new(HttpFetcher::new(config.timeout())?),
//!     Arc::new(HostSignals::new()),
//! );
//!
//! worker.handle(LifecycleEvent::Install).await?;
//! worker.handle(LifecycleEvent::Activate).await?;
//! let outcome = worker
//!     .handle(LifecycleEvent::Fetch(ResourceRequest::get("http://localhost:8080/main.dart.js")))
//!     .await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `OFFLINE_SYNC_ORIGIN` | Deployment origin (default: `http://localhost:8080`) |
//! | `OFFLINE_SYNC_CACHE_DIR` | Store root (default: `<cache dir>/offline-sync`) |
//! | `OFFLINE_SYNC_PUSH_URL` | Push endpoint for [`PushClient`] |
//! | `OFFLINE_SYNC_TIMEOUT` | Request timeout in seconds (default: none) |

pub mod config;
mod digest;
pub mod error;
pub mod fetch;
pub mod host;
pub mod key;
pub mod manifest;
pub mod push;
pub mod store;
pub mod types;
pub mod worker;

// Re-export main types
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use fetch::{Fetcher, HttpFetcher, SYNC_USER_AGENT};
pub use host::{HostControl, HostSignals};
pub use key::{cache_key, Origin};
pub use manifest::{Deployment, ResourceManifest, ShellList, FINGERPRINT_LEN, ROOT_KEY};
pub use push::PushClient;
pub use store::{CacheStorage, CacheStore, FsStorage, MemoryStorage, StoreNames};
pub use types::{CacheMode, CachedResponse, ResourceRequest};

// Request methods are reqwest's.
pub use reqwest::Method;
pub use worker::{
    ActivationReport, Command, DownloadReport, EventOutcome, InstallReport, Interception,
    LifecycleEvent, OfflineWorker, MANIFEST_KEY, PENDING_MANIFEST_KEY,
};
