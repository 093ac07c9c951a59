use serde_json::json;

use super::runtime;
use crate::cli::args::{GlobalArgs, StatusArgs};
use crate::exit_codes::SUCCESS;

pub async fn run(args: StatusArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = runtime::worker(global).await?;
    let persisted = worker.persisted_manifest().await?;
    let missing = worker.missing_resources().await?;

    let activated = persisted.is_some();
    let current = persisted.as_ref() == Some(worker.manifest());

    if args.json {
        let report = json!({
            "origin": worker.origin().as_str(),
            "resources": worker.manifest().len(),
            "shell": worker.deployment().shell.len(),
            "activated": activated,
            "current": current,
            "missing": missing,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(SUCCESS);
    }

    println!("origin:    {}", worker.origin());
    println!(
        "resources: {} ({} shell)",
        worker.manifest().len(),
        worker.deployment().shell.len()
    );
    let state = match (activated, current) {
        (false, _) => "not activated",
        (true, true) => "current",
        (true, false) => "stale (activate to upgrade)",
    };
    println!("manifest:  {}", state);
    println!("missing:   {}", missing.len());
    for key in &missing {
        println!("  {}", key);
    }
    Ok(SUCCESS)
}
