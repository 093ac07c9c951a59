//! Synchronizer configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SyncResult;
use crate::key::Origin;
use crate::store::StoreNames;

/// Runtime configuration shared by the worker, fetcher and push client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Deployment origin the manifest keys are relative to.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Root directory of the filesystem stores.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Push endpoint URL.
    #[serde(default)]
    pub push_url: Option<String>,

    /// Request timeout in seconds; `None` waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Store names.
    #[serde(default)]
    pub stores: StoreNames,
}

fn default_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join("offline-sync"))
        .unwrap_or_else(|| PathBuf::from("/tmp/offline-sync"))
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_dir: default_cache_dir(),
            push_url: None,
            timeout_secs: None,
            stores: StoreNames::default(),
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `OFFLINE_SYNC_ORIGIN` | Deployment origin |
    /// | `OFFLINE_SYNC_CACHE_DIR` | Store root directory |
    /// | `OFFLINE_SYNC_PUSH_URL` | Push endpoint |
    /// | `OFFLINE_SYNC_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            origin: std::env::var("OFFLINE_SYNC_ORIGIN").unwrap_or_else(|_| default_origin()),
            cache_dir: std::env::var_os("OFFLINE_SYNC_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_dir),
            push_url: std::env::var("OFFLINE_SYNC_PUSH_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            timeout_secs: std::env::var("OFFLINE_SYNC_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok()),
            stores: StoreNames::default(),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_push_url(mut self, url: impl Into<String>) -> Self {
        self.push_url = Some(url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn parsed_origin(&self) -> SyncResult<Origin> {
        Origin::parse(&self.origin)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
