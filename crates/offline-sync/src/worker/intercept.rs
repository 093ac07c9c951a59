//! Request interception policies.

use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::key::cache_key;
use crate::manifest::ROOT_KEY;
use crate::types::{CachedResponse, ResourceRequest};

use super::OfflineWorker;

/// Decision for one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Not a known versioned resource; let the host fetch it normally.
    Passthrough,
    Respond(CachedResponse),
}

impl OfflineWorker {
    /// Route a request: passthrough for non-reads and unknown keys,
    /// online-first for the root document, cache-first for everything else.
    pub async fn intercept(&self, request: &ResourceRequest) -> SyncResult<Interception> {
        if !request.is_read() {
            return Ok(Interception::Passthrough);
        }

        let key = match self.origin.request_key(&request.url) {
            Some(key) if self.manifest().contains(&key) => key,
            _ => {
                debug!(url = %request.url, "not a versioned resource, passing through");
                return Ok(Interception::Passthrough);
            }
        };

        let response = if key == ROOT_KEY {
            self.online_first(request).await?
        } else {
            self.cache_first(request).await?
        };
        Ok(Interception::Respond(response))
    }

    /// Serve from content; otherwise fetch and keep a copy of ok responses.
    async fn cache_first(&self, request: &ResourceRequest) -> SyncResult<CachedResponse> {
        let content = self.open_content().await?;
        let key = cache_key(&request.url);

        match content.get(key).await {
            Ok(Some(hit)) => {
                debug!(url = %request.url, "cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e @ SyncError::Integrity { .. }) => {
                warn!(error = %e, "evicting corrupt cache entry");
                content.delete(key).await?;
            }
            Err(e) => return Err(e),
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_ok() {
            if let Err(e) = content.put(key, &response).await {
                warn!(url = %request.url, error = %e, "failed to cache response");
            }
        } else {
            debug!(url = %request.url, status = response.status, "not caching non-ok response");
        }
        Ok(response)
    }

    /// Network first so the entry document tracks the latest deployment;
    /// the cached copy is only a fallback for network faults.
    ///
    /// Every spelling of the root (`origin`, `origin/`, `origin/#/route`)
    /// shares one entry under the resolved root URL.
    async fn online_first(&self, request: &ResourceRequest) -> SyncResult<CachedResponse> {
        let content = self.open_content().await?;
        let root = self.origin.resolve(ROOT_KEY);
        let key = root.as_str();

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if let Err(e) = content.put(key, &response).await {
                    warn!(url = %request.url, error = %e, "failed to cache root document");
                }
                Ok(response)
            }
            Err(fault) => match content.get(key).await {
                Ok(Some(cached)) => {
                    warn!(error = %fault, "network unavailable, serving cached root document");
                    Ok(cached)
                }
                Ok(None) => Err(fault),
                Err(e) => {
                    warn!(error = %e, "cached root document unreadable");
                    Err(fault)
                }
            },
        }
    }
}
