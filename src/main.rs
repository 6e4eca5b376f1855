//! Entry point for switchboard, a terminal chat client whose model can call
//! into Jira, Confluence, Slack and the local workspace.
//!
//! Loads `.env`, installs tracing, parses CLI arguments via [`cli`] and
//! dispatches the chosen subcommand.

mod agent;
mod chat;
mod cli;
mod config;
mod constants;
mod conversation;
mod format;
mod logging;
mod message;
mod output;
mod provider;
mod schema;
mod tools;

use anyhow::Result;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    logging::init();
    let cli = cli::parse();
    cli::run(cli).await
}
