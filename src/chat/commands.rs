//! Slash command handlers for the chat REPL.
//!
//! Returns a [`CommandAction`] so the REPL loop can decide how to proceed;
//! only the loop itself may replace the conversation.

use colored::Colorize;

use crate::conversation::Conversation;
use crate::format;
use crate::tools::ToolRegistry;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CommandAction {
    /// Command was handled; continue the REPL loop.
    Continue,
    /// Start over with a fresh conversation.
    Clear,
    Unknown(String),
}

pub(crate) fn handle_slash_command(
    command: &str,
    conversation: &Conversation,
    tools: &ToolRegistry,
) -> CommandAction {
    match command {
        "/history" => {
            if conversation.transcript().next().is_none() {
                println!("{}", "No messages yet.".dimmed());
            }
            for msg in conversation.transcript() {
                println!("{}", format::format_message(msg));
                println!();
            }
            CommandAction::Continue
        }
        "/clear" => CommandAction::Clear,
        "/tools" => {
            for descriptor in tools.descriptors() {
                println!("  {} - {}", descriptor.name.cyan(), descriptor.description);
            }
            CommandAction::Continue
        }
        "/help" => {
            println!("{}", "Commands:".bold());
            println!("  {} - show conversation history", "/history".cyan());
            println!("  {} - start a new conversation", "/clear".cyan());
            println!("  {} - list available tools", "/tools".cyan());
            println!("  {} - show this help", "/help".cyan());
            println!("  {} - exit", "Ctrl+D".cyan());
            CommandAction::Continue
        }
        _ => CommandAction::Unknown(command.to_string()),
    }
}
