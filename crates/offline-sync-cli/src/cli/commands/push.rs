use anyhow::Context;
use offline_sync::PushClient;

use super::runtime;
use crate::cli::args::{GlobalArgs, PushArgs};
use crate::exit_codes::SUCCESS;

pub async fn run(args: PushArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let config = runtime::config(global);

    let raw = match args.payload.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload file {}", path))?,
        None => args.payload.clone(),
    };
    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("payload is not valid JSON")?;

    let timeout = config.timeout();
    let client = PushClient::new(config.push_url.unwrap_or_default(), timeout)?;
    let reply = client.push(&payload).await?;

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(SUCCESS)
}
