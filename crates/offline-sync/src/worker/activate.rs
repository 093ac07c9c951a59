//! Activation: reconcile staging, content and the persisted manifest.
//!
//! Entries are only ever deleted or overwritten in place, so a concurrent
//! request never sees a store that is being rebuilt elsewhere. Any fault
//! wipes all three stores; the next activation then starts from scratch.

use tracing::{debug, error, info};

use crate::error::{SyncError, SyncResult};

use super::{manifest_response, read_manifest, OfflineWorker, MANIFEST_KEY, PENDING_MANIFEST_KEY};

/// What an activation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// A manifest from a previous activation was found and diffed against.
    pub upgraded: bool,

    /// Content keys evicted as stale or unknown.
    pub deleted: Vec<String>,

    /// Content keys kept because their fingerprint did not change.
    pub preserved: Vec<String>,

    /// Keys copied from the staging store into content.
    pub shell_copied: Vec<String>,
}

impl OfflineWorker {
    /// Bring the content store in line with this deployment's manifest.
    ///
    /// On success the new manifest is persisted and the host is asked to
    /// claim open clients. On failure every store is deleted and the cause
    /// is returned inside [`SyncError::Activation`].
    pub async fn activate(&self) -> SyncResult<ActivationReport> {
        match self.reconcile().await {
            Ok(report) => {
                self.host.claim_clients();
                info!(
                    upgraded = report.upgraded,
                    deleted = report.deleted.len(),
                    preserved = report.preserved.len(),
                    shell = report.shell_copied.len(),
                    "activation complete"
                );
                Ok(report)
            }
            Err(cause) => {
                error!(error = %cause, "failed to upgrade offline cache, resetting all stores");
                for name in self.stores.all() {
                    if let Err(e) = self.storage.delete(name).await {
                        error!(store = name, error = %e, "failed to delete store during reset");
                    }
                }
                Err(SyncError::Activation {
                    cause: Box::new(cause),
                })
            }
        }
    }

    async fn reconcile(&self) -> SyncResult<ActivationReport> {
        let mut content = self.open_content().await?;
        let staging = self.storage.open(&self.stores.staging).await?;
        let manifest_store = self.storage.open(&self.stores.manifest).await?;

        // Leftover from an activation that died mid-commit.
        manifest_store.delete(PENDING_MANIFEST_KEY).await?;

        let previous = read_manifest(manifest_store.as_ref(), MANIFEST_KEY).await?;
        let mut report = ActivationReport::default();

        match previous {
            None => {
                debug!("no persisted manifest, rebuilding content store");
                self.storage.delete(&self.stores.content).await?;
                content = self.open_content().await?;
            }
            Some(previous) => {
                report.upgraded = true;
                for key in content.keys().await? {
                    let current = self
                        .origin
                        .relative_key(&key)
                        .is_some_and(|resource| self.manifest().is_current(&resource, &previous));
                    if current {
                        report.preserved.push(key);
                    } else {
                        content.delete(&key).await?;
                        debug!(key = %key, "evicted stale entry");
                        report.deleted.push(key);
                    }
                }
            }
        }

        // The shell always wins, even over entries kept above.
        for key in staging.keys().await? {
            let Some(response) = staging.get(&key).await? else {
                continue;
            };
            content.put(&key, &response).await?;
            report.shell_copied.push(key);
        }

        let next = manifest_response(self.manifest())?;
        manifest_store.put(PENDING_MANIFEST_KEY, &next).await?;
        self.storage.delete(&self.stores.staging).await?;
        manifest_store.put(MANIFEST_KEY, &next).await?;
        manifest_store.delete(PENDING_MANIFEST_KEY).await?;

        Ok(report)
    }
}
