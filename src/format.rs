//! Terminal formatting for transcripts and answers.

use colored::Colorize;

use crate::message::{Message, Role};

/// Tool results are often long API dumps; the transcript shows a preview.
const TOOL_PREVIEW_LINES: usize = 6;

/// Format a message for terminal display with role label and colors.
pub fn format_message(msg: &Message) -> String {
    let label = role_label(msg);
    let body = match msg.role {
        Role::User => msg.text().to_string(),
        Role::Assistant if msg.requests_tools() => {
            let names: Vec<&str> = msg.tool_calls.iter().map(|c| c.name()).collect();
            format!("requested {}", names.join(", ")).dimmed().to_string()
        }
        Role::Assistant => render_markdown_lite(msg.text()),
        Role::Tool => preview(msg.text()).dimmed().to_string(),
        Role::System => msg.text().dimmed().to_string(),
    };
    format!("{label}\n{body}")
}

fn role_label(msg: &Message) -> String {
    match msg.role {
        Role::User => "you:".green().bold().to_string(),
        Role::Assistant => "assistant:".cyan().bold().to_string(),
        Role::System => "system:".dimmed().to_string(),
        Role::Tool => match msg.name.as_deref() {
            Some(name) => format!("tool ({name}):").yellow().to_string(),
            None => "tool:".yellow().to_string(),
        },
    }
}

fn preview(text: &str) -> String {
    let total = text.lines().count();
    if total <= TOOL_PREVIEW_LINES {
        return text.to_string();
    }
    let mut shown: Vec<&str> = text.lines().take(TOOL_PREVIEW_LINES).collect();
    let more = format!("... ({} more lines)", total - TOOL_PREVIEW_LINES);
    shown.push(&more);
    shown.join("\n")
}

/// Minimal markdown renderer for terminal output.
///
/// Handles bold, inline code, headings and fenced code blocks; everything
/// else passes through untouched.
pub fn render_markdown_lite(text: &str) -> String {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for line in text.lines() {
        if let Some(lang) = line.strip_prefix("```") {
            in_code_block = !in_code_block;
            if in_code_block && !lang.trim().is_empty() {
                lines.push(format!("  {}", lang.trim().dimmed()));
            }
            continue;
        }

        if in_code_block {
            lines.push(format!("  {}", line.dimmed()));
        } else if let Some(heading) = heading_text(line) {
            lines.push(heading.bold().underline().to_string());
        } else {
            lines.push(render_inline(line));
        }
    }

    lines.join("\n")
}

fn heading_text(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches('#');
    let level = line.len() - rest.len();
    if (1..=6).contains(&level) && rest.starts_with(' ') {
        Some(rest.trim())
    } else {
        None
    }
}

/// Handle `**bold**` and `` `inline code` `` within a single line.
fn render_inline(line: &str) -> String {
    let mut out = String::new();
    let mut rest = line;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                out.push_str(&after[..end].bold().to_string());
                rest = &after[end + 2..];
                continue;
            }
        }
        if let Some(after) = rest.strip_prefix('`') {
            if let Some(end) = after.find('`') {
                out.push_str(&after[..end].dimmed().to_string());
                rest = &after[end + 1..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCallRequest;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn inline_markers_are_stripped() {
        plain();
        assert_eq!(render_inline("use **bold** and `code`"), "use bold and code");
        assert_eq!(render_inline("dangling ** and `"), "dangling ** and `");
        assert_eq!(render_inline("naïve **café**"), "naïve café");
    }

    #[test]
    fn code_fences_and_headings() {
        plain();
        let out = render_markdown_lite("# Title\n```rust\nlet x = 1;\n```\ndone");
        assert_eq!(out, "Title\n  rust\n  let x = 1;\ndone");
    }

    #[test]
    fn tool_messages_are_labelled_and_truncated() {
        plain();
        let body = (1..=10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let out = format_message(&Message::tool_result("c1", "search_slack", body));
        assert!(out.starts_with("tool (search_slack):\n"));
        assert!(out.contains("line 6"));
        assert!(!out.contains("line 7"));
        assert!(out.ends_with("... (4 more lines)"));
    }

    #[test]
    fn tool_requests_list_names() {
        plain();
        let msg = Message::assistant_tool_calls(
            None,
            vec![
                ToolCallRequest::new("a", "list_files", "{}"),
                ToolCallRequest::new("b", "read_file", "{}"),
            ],
        );
        assert_eq!(format_message(&msg), "assistant:\nrequested list_files, read_file");
    }
}
