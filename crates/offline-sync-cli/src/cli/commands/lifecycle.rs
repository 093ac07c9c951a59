use anyhow::Context;
use offline_sync::{EventOutcome, LifecycleEvent};

use super::runtime;
use crate::cli::args::GlobalArgs;
use crate::exit_codes::SUCCESS;

pub async fn install(global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = runtime::worker(global).await?;
    let outcome = worker
        .handle(LifecycleEvent::Install)
        .await
        .context("install failed")?;

    if let EventOutcome::Installed(report) = outcome {
        for url in &report.staged {
            println!("staged {}", url);
        }
        eprintln!("Installed {} shell resources", report.staged.len());
    }
    Ok(SUCCESS)
}

pub async fn activate(global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = runtime::worker(global).await?;
    let outcome = worker
        .handle(LifecycleEvent::Activate)
        .await
        .context("activation failed, all stores were reset")?;

    if let EventOutcome::Activated(report) = outcome {
        for url in &report.deleted {
            println!("evicted {}", url);
        }
        for url in &report.shell_copied {
            println!("shell {}", url);
        }
        eprintln!(
            "Activated ({}): {} evicted, {} preserved, {} shell",
            if report.upgraded { "upgrade" } else { "fresh" },
            report.deleted.len(),
            report.preserved.len(),
            report.shell_copied.len()
        );
    }
    Ok(SUCCESS)
}
