use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::types::CacheMode;

use super::OfflineWorker;

/// Result of a successful install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// URLs written to the staging store, in shell order.
    pub staged: Vec<String>,
}

impl OfflineWorker {
    /// Stage the shell resources for the next activation.
    ///
    /// Skip-waiting is signalled up front. Shell resources are fetched with
    /// cache bypass; nothing is staged unless every fetch succeeds.
    pub async fn install(&self) -> SyncResult<InstallReport> {
        self.host.skip_waiting();

        let shell: Vec<String> = self.deployment.shell.iter().map(String::from).collect();
        info!(resources = shell.len(), "installing shell resources");

        let fetched = self
            .fetch_all(&shell, CacheMode::Reload)
            .await
            .map_err(|e| SyncError::Install {
                message: e.to_string(),
            })?;

        let staging = self
            .storage
            .open(&self.stores.staging)
            .await
            .map_err(|e| SyncError::Install {
                message: e.to_string(),
            })?;

        let mut report = InstallReport::default();
        for (url, response) in &fetched {
            if let Err(e) = staging.put(url, response).await {
                // Drop the half-written staging store; the host retries install.
                if let Err(cleanup) = self.storage.delete(&self.stores.staging).await {
                    warn!(error = %cleanup, "failed to discard partial staging store");
                }
                return Err(SyncError::Install {
                    message: e.to_string(),
                });
            }
            report.staged.push(url.clone());
        }

        info!(staged = report.staged.len(), "shell resources staged");
        Ok(report)
    }
}
