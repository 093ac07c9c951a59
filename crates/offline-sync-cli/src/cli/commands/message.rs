use offline_sync::{EventOutcome, LifecycleEvent};

use super::runtime;
use crate::cli::args::{GlobalArgs, MessageArgs};
use crate::exit_codes::SUCCESS;

pub async fn run(args: MessageArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = runtime::worker(global).await?;
    let outcome = worker.handle(LifecycleEvent::Message(args.text.clone())).await?;

    match outcome {
        EventOutcome::SkippedWaiting => println!("skip-waiting signalled"),
        EventOutcome::Downloaded(report) => {
            for key in &report.fetched {
                println!("downloaded {}", key);
            }
            eprintln!("Offline copy complete ({} fetched)", report.fetched.len());
        }
        _ => println!("ignored {:?}", args.text),
    }
    Ok(SUCCESS)
}
