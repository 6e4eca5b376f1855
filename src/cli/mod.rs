//! Command-line interface definition and dispatch for switchboard.
//!
//! Uses [`clap`] derive macros. `ask` and `chat` share the same wiring:
//! config, provider client and bundled tools assembled into an
//! [`Orchestrator`].

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;

use crate::agent::{Orchestrator, TurnOutcome};
use crate::chat;
use crate::config::Config;
use crate::conversation::Conversation;
use crate::output::{EventLog, StdoutRenderer};
use crate::provider::OpenRouterClient;
use crate::tools::ToolRegistry;

/// Top-level CLI structure for switchboard.
#[derive(Parser)]
#[command(
    name = "switchboard",
    version,
    about = "Chat with a model that can search your Jira, Confluence, Slack and files"
)]
pub struct Cli {
    /// Model to use (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands. Variant doc comments double as `--help` text.
#[derive(Subcommand)]
pub enum Commands {
    /// Ask a one-shot question
    Ask {
        /// The question to ask
        prompt: Vec<String>,
        /// Print the turn's events as JSON instead of rendering them
        #[arg(long)]
        json: bool,
    },
    /// Start an interactive chat session
    Chat,
    /// Print the tool descriptors sent to the provider
    Tools {
        /// Only print tool names
        #[arg(long)]
        names: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective config with secrets masked
    Show,
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Load config and apply command-line overrides.
fn load_config(model: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(model) = model {
        config.model = model;
    }
    Ok(config)
}

/// Assemble the provider client and bundled tools for `config`.
pub(crate) fn orchestrator(config: &Config) -> Result<Orchestrator> {
    let client = OpenRouterClient::from_config(config)?;
    let tools = ToolRegistry::with_builtins(config)?;
    Ok(Orchestrator::new(client, tools).provider_timeout(config.provider_timeout()))
}

fn exit_code(outcome: &TurnOutcome) -> ExitCode {
    if outcome.is_final_answer() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// The exit code is non-zero when a one-shot question ends without an
/// answer; configuration problems surface as errors.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Ask { prompt, json } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                anyhow::bail!("No prompt provided. Usage: switchboard ask \"your question here\"");
            }
            let config = load_config(cli.model)?;
            let agent = orchestrator(&config)?;
            let mut conversation = Conversation::with_system_prompt(config.system_prompt.as_deref());

            if json {
                let mut log = EventLog::new();
                let outcome = agent.run_turn(&mut conversation, &prompt, &mut log).await;
                println!("{}", serde_json::to_string_pretty(log.events())?);
                return Ok(exit_code(&outcome));
            }

            println!(
                "{} [model: {}]",
                "switchboard".bold().cyan(),
                agent.model().yellow()
            );
            println!();
            println!("{} {}", ">".green().bold(), prompt);
            println!();

            let mut renderer = StdoutRenderer::new();
            let outcome = agent.run_turn(&mut conversation, &prompt, &mut renderer).await;
            Ok(exit_code(&outcome))
        }
        Commands::Chat => {
            let config = load_config(cli.model)?;
            chat::run_chat(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tools { names } => {
            let config = load_config(cli.model)?;
            let tools = ToolRegistry::with_builtins(&config)?;
            if names {
                for name in tools.names() {
                    println!("{name}");
                }
            } else {
                println!("{}", serde_json::to_string_pretty(tools.descriptors())?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => {
            let config = load_config(cli.model)?;
            match action {
                ConfigAction::Show => {
                    let path = Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    println!("{}", toml::to_string_pretty(&config.masked())?);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_model_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["switchboard", "ask", "-m", "anthropic/claude", "hi", "there"])
            .unwrap();
        assert_eq!(cli.model.as_deref(), Some("anthropic/claude"));
        match cli.command {
            Commands::Ask { prompt, json } => {
                assert_eq!(prompt, vec!["hi", "there"]);
                assert!(!json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn tools_names_flag() {
        let cli = Cli::try_parse_from(["switchboard", "tools", "--names"]).unwrap();
        assert!(matches!(cli.command, Commands::Tools { names: true }));
    }

    #[test]
    fn config_requires_action() {
        assert!(Cli::try_parse_from(["switchboard", "config"]).is_err());
        assert!(Cli::try_parse_from(["switchboard", "config", "show"]).is_ok());
    }
}
