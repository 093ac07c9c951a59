//! Network access for the worker.
//!
//! Status codes are never errors here: a 404 is a response the caller may
//! decide not to cache. Only transport failures become [`SyncError::Network`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA, USER_AGENT};
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::types::{CacheMode, CachedResponse, ResourceRequest};

/// User-Agent sent with every request.
pub const SYNC_USER_AGENT: &str = concat!("offline-sync/", env!("CARGO_PKG_VERSION"));

/// Performs network requests on behalf of the worker.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &ResourceRequest) -> SyncResult<CachedResponse>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher; `timeout` of `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> SyncResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(SYNC_USER_AGENT));

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| SyncError::Network {
            message: format!("failed to create HTTP client: {}", e),
        })?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &ResourceRequest) -> SyncResult<CachedResponse> {
        debug!(method = %request.method, url = %request.url, cache = ?request.cache, "fetching");

        let mut builder = self.client.request(request.method.clone(), &request.url);
        if request.cache == CacheMode::Reload {
            builder = builder
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await.map_err(|e| SyncError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(CachedResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
