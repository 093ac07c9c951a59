//! Out-of-band commands sent by the controlling application.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info};

use crate::error::SyncResult;
use crate::types::CacheMode;

use super::{EventOutcome, OfflineWorker};

/// Commands accepted over the message channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SkipWaiting,
    DownloadOffline,
}

impl Command {
    /// Exact wire names; anything else is not a command.
    pub fn parse(message: &str) -> Option<Self> {
        match message {
            "skipWaiting" => Some(Self::SkipWaiting),
            "downloadOffline" => Some(Self::DownloadOffline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipWaiting => "skipWaiting",
            Self::DownloadOffline => "downloadOffline",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of warming the offline copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Manifest keys fetched and stored.
    pub fetched: Vec<String>,
}

impl OfflineWorker {
    pub(super) async fn on_message(&self, message: &str) -> SyncResult<EventOutcome> {
        match Command::parse(message) {
            Some(Command::SkipWaiting) => {
                self.host.skip_waiting();
                Ok(EventOutcome::SkippedWaiting)
            }
            Some(Command::DownloadOffline) => {
                self.download_offline().await.map(EventOutcome::Downloaded)
            }
            None => {
                debug!(message, "ignoring unknown message");
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Manifest keys with no entry in the content store.
    pub async fn missing_resources(&self) -> SyncResult<Vec<String>> {
        let content = self.open_content().await?;
        let present: HashSet<String> = content
            .keys()
            .await?
            .iter()
            .filter_map(|url| self.origin.relative_key(url))
            .collect();
        Ok(self.manifest().missing_from(&present))
    }

    /// Fetch and store every manifest resource not yet cached.
    ///
    /// All-or-nothing like install; a second call finds nothing missing.
    pub async fn download_offline(&self) -> SyncResult<DownloadReport> {
        let missing = self.missing_resources().await?;
        if missing.is_empty() {
            debug!("offline copy already complete");
            return Ok(DownloadReport::default());
        }

        info!(resources = missing.len(), "downloading offline copy");
        let fetched = self.fetch_all(&missing, CacheMode::Default).await?;

        let content = self.open_content().await?;
        for (url, response) in &fetched {
            content.put(url, response).await?;
        }

        Ok(DownloadReport { fetched: missing })
    }
}
