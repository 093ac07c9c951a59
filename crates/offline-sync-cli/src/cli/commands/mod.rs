use super::args::*;

pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod push;
mod runtime;
pub mod status;

use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let global = cli.global;
    match cli.cmd {
        Command::Install => lifecycle::install(&global).await,
        Command::Activate => lifecycle::activate(&global).await,
        Command::Fetch(args) => fetch::run(args, &global).await,
        Command::Message(args) => message::run(args, &global).await,
        Command::Status(args) => status::run(args, &global).await,
        Command::Push(args) => push::run(args, &global).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
