//! Caller-facing output of a turn.
//!
//! [`TurnSink`] decouples the orchestration loop from the display layer.
//! The loop calls it as the turn progresses: zero or more tool
//! notifications, then exactly one answer or one error. [`StdoutRenderer`]
//! prints to the terminal; [`EventLog`] just records what happened.

use colored::Colorize;
use serde::Serialize;

use crate::format;

/// Receives the chunks of a turn in the order they are produced.
pub trait TurnSink {
    /// A capability is about to be invoked.
    fn on_tool_call(&mut self, name: &str);

    /// The provider produced its final answer.
    fn on_answer(&mut self, text: &str);

    /// The turn ended without an answer.
    fn on_error(&mut self, message: &str);
}

/// One chunk emitted during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum TurnEvent {
    ToolCall(String),
    Answer(String),
    Error(String),
}

impl TurnEvent {
    /// The chunk as plain text.
    pub fn text(&self) -> String {
        match self {
            TurnEvent::ToolCall(name) => format!("invoking tool {name}"),
            TurnEvent::Answer(text) | TurnEvent::Error(text) => text.clone(),
        }
    }
}

/// Collects every event of a turn.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<TurnEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TurnEvent] {
        &self.events
    }

    /// Names of the tools invoked, in order.
    pub fn tool_calls(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TurnEvent::ToolCall(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl TurnSink for EventLog {
    fn on_tool_call(&mut self, name: &str) {
        self.events.push(TurnEvent::ToolCall(name.to_string()));
    }

    fn on_answer(&mut self, text: &str) {
        self.events.push(TurnEvent::Answer(text.to_string()));
    }

    fn on_error(&mut self, message: &str) {
        self.events.push(TurnEvent::Error(message.to_string()));
    }
}

/// Prints turn output to the terminal.
///
/// Tool notifications and the answer go to stdout, errors to stderr.
/// Answers are rendered with the markdown-lite formatter.
#[derive(Debug, Default)]
pub struct StdoutRenderer {
    tool_calls: usize,
}

impl StdoutRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TurnSink for StdoutRenderer {
    fn on_tool_call(&mut self, name: &str) {
        self.tool_calls += 1;
        println!("{} {}", "⚙".yellow(), TurnEvent::ToolCall(name.to_string()).text().dimmed());
    }

    fn on_answer(&mut self, text: &str) {
        if self.tool_calls > 0 {
            println!();
        }
        println!("{}", format::render_markdown_lite(text));
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
}
