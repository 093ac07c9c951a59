//! Forward JSON records to a remote spreadsheet-backed endpoint.
//!
//! One POST per call: no retry, no batching, no authentication.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::{error, info};

use crate::error::{SyncError, SyncResult};
use crate::fetch::SYNC_USER_AGENT;

/// Client for the push endpoint.
#[derive(Debug, Clone)]
pub struct PushClient {
    client: reqwest::Client,
    url: String,
}

impl PushClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> SyncResult<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(SyncError::Config {
                message: "push URL is not configured".to_string(),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(SYNC_USER_AGENT));

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| SyncError::Network {
            message: format!("failed to create HTTP client: {}", e),
        })?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `payload` as JSON and return the endpoint's parsed JSON reply.
    ///
    /// Failures are logged and returned as-is.
    pub async fn push<T>(&self, payload: &T) -> SyncResult<serde_json::Value>
    where
        T: Serialize + ?Sized,
    {
        match self.post(payload).await {
            Ok(result) => {
                info!(url = %self.url, "pushed record");
                Ok(result)
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "failed to push record");
                Err(e)
            }
        }
    }

    async fn post<T>(&self, payload: &T) -> SyncResult<serde_json::Value>
    where
        T: Serialize + ?Sized,
    {
        let response = self.client.post(&self.url).json(payload).send().await?;
        response
            .json()
            .await
            .map_err(|e| SyncError::InvalidResponse {
                message: format!("failed to parse push response: {}", e),
            })
    }
}
