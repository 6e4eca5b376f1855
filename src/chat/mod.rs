//! Interactive chat REPL for switchboard.
//!
//! Provides a multi-turn conversation loop using [`rustyline`] for readline
//! support (history, line editing). Each line becomes one turn of the
//! [`Orchestrator`]; the conversation lives in memory for the whole session.

mod commands;

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::config::Config;
use crate::conversation::Conversation;
use crate::output::StdoutRenderer;

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C**: cancels current input, stays in REPL
/// - **Ctrl+D**: exits cleanly with "goodbye."
/// - Readline history is persisted to `~/.cache/switchboard/chat_history.txt`
pub async fn run_chat(config: Config) -> Result<()> {
    let agent = crate::cli::orchestrator(&config)?;
    let mut conversation = Conversation::with_system_prompt(config.system_prompt.as_deref());

    println!(
        "{} [session: {}] [model: {}] [tools: {}] (Ctrl+D to exit)",
        "switchboard chat".bold().cyan(),
        conversation.short_id().yellow(),
        agent.model().yellow(),
        agent.tools().len(),
    );
    println!();

    let mut rl = DefaultEditor::new()?;
    let history_path = Config::history_path()?;
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        match rl.readline(&format!("{} ", ">".green().bold())) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.starts_with('/') {
                    match commands::handle_slash_command(line, &conversation, agent.tools()) {
                        commands::CommandAction::Continue => {}
                        commands::CommandAction::Clear => {
                            conversation =
                                Conversation::with_system_prompt(config.system_prompt.as_deref());
                            println!(
                                "{} [session: {}]",
                                "History cleared.".dimmed(),
                                conversation.short_id().yellow()
                            );
                        }
                        commands::CommandAction::Unknown(cmd) => {
                            println!("{} Unknown command: {}", "?".yellow(), cmd);
                        }
                    }
                    continue;
                }

                println!();
                let mut renderer = StdoutRenderer::new();
                agent.run_turn(&mut conversation, line, &mut renderer).await;
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "goodbye.".dimmed());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}
