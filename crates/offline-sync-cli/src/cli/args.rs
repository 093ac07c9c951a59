use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "offline-sync",
    version,
    about = "Keep an offline content cache in step with a deployment manifest"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Deployment file: resource manifest plus shell list
    #[arg(
        long,
        global = true,
        env = "OFFLINE_SYNC_DEPLOYMENT",
        default_value = "deployment.json"
    )]
    pub deployment: PathBuf,

    /// Origin the manifest keys are served from
    #[arg(long, global = true, env = "OFFLINE_SYNC_ORIGIN")]
    pub origin: Option<String>,

    /// Directory holding the cache stores
    #[arg(long, global = true, env = "OFFLINE_SYNC_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Push endpoint URL
    #[arg(long, global = true, env = "OFFLINE_SYNC_PUSH_URL")]
    pub push_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "OFFLINE_SYNC_TIMEOUT")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Stage the shell resources for the next activation
    Install,
    /// Reconcile the content cache with the deployment manifest
    Activate,
    /// Route one request through the interceptor
    Fetch(FetchArgs),
    /// Deliver a client message (skipWaiting, downloadOffline)
    Message(MessageArgs),
    /// Show persisted manifest state and missing resources
    Status(StatusArgs),
    /// POST a JSON record to the push endpoint
    Push(PushArgs),
    /// Print the version number
    Version,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Absolute URL, or a path relative to the origin
    pub target: String,

    /// HTTP method
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Write the body here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MessageArgs {
    pub text: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// Inline JSON, or @path to read it from a file
    pub payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "offline-sync",
            "fetch",
            "main.dart.js",
            "--origin",
            "https://app.example.com",
            "-o",
            "out.js",
        ])
        .unwrap();

        assert_eq!(cli.global.origin.as_deref(), Some("https://app.example.com"));
        let Command::Fetch(args) = cli.cmd else {
            panic!("expected fetch");
        };
        assert_eq!(args.target, "main.dart.js");
        assert_eq!(args.method, "GET");
        assert_eq!(args.output, Some(PathBuf::from("out.js")));
    }

    #[test]
    fn test_message_requires_text() {
        assert!(Cli::try_parse_from(["offline-sync", "message"]).is_err());
    }
}
