//! Binary crate for the `lakecast` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive credential configuration
//! - Logging setup and exit status

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let cmd = cli::Cli::parse();
    if let Err(e) = cmd.run().await {
        log::error!("Run aborted: {e:#}");
        std::process::exit(1);
    }
}
