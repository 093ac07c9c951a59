use std::io::Write;

use anyhow::Context;
use offline_sync::{EventOutcome, LifecycleEvent, Method, ResourceRequest};

use super::runtime;
use crate::cli::args::{FetchArgs, GlobalArgs};
use crate::exit_codes::SUCCESS;

pub async fn run(args: FetchArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = runtime::worker(global).await?;

    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method {:?}", args.method))?;
    let url = if args.target.contains("://") {
        args.target.clone()
    } else {
        worker.origin().resolve(&args.target)
    };

    let outcome = worker
        .handle(LifecycleEvent::Fetch(ResourceRequest::new(method, url.clone())))
        .await
        .with_context(|| format!("fetch {} failed", url))?;

    match outcome {
        EventOutcome::Responded(response) => {
            eprintln!("HTTP {} {}", response.status, url);
            match &args.output {
                Some(path) => std::fs::write(path, &response.body)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => std::io::stdout()
                    .write_all(&response.body)
                    .context("failed to write body")?,
            }
        }
        _ => println!("passthrough {}", url),
    }
    Ok(SUCCESS)
}
