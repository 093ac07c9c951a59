//! Wiring from global flags to a worker backed by the filesystem and network.

use std::sync::Arc;

use anyhow::Context;
use offline_sync::{
    Deployment, FsStorage, HostSignals, HttpFetcher, OfflineWorker, SyncConfig,
};

use crate::cli::args::GlobalArgs;

/// Environment first, then explicit flags on top.
pub fn config(global: &GlobalArgs) -> SyncConfig {
    let mut config = SyncConfig::from_env();
    if let Some(origin) = &global.origin {
        config = config.with_origin(origin.clone());
    }
    if let Some(dir) = &global.cache_dir {
        config = config.with_cache_dir(dir.clone());
    }
    if let Some(url) = &global.push_url {
        config = config.with_push_url(url.clone());
    }
    if let Some(secs) = global.timeout {
        config = config.with_timeout_secs(secs);
    }
    config
}

pub async fn worker(global: &GlobalArgs) -> anyhow::Result<OfflineWorker> {
    let config = config(global);
    let deployment = Deployment::load(&global.deployment).await?;
    let origin = config.parsed_origin()?;
    let fetcher = HttpFetcher::new(config.timeout()).context("failed to build HTTP client")?;

    tracing::debug!(
        origin = %origin,
        cache_dir = %config.cache_dir.display(),
        resources = deployment.resources.len(),
        "worker ready"
    );

    Ok(OfflineWorker::new(
        deployment,
        origin,
        Arc::new(FsStorage::new(&config.cache_dir)),
        Arc::new(fetcher),
        Arc::new(HostSignals::new()),
    )
    .with_store_names(config.stores))
}
