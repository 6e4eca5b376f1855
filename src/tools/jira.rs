//! Jira Cloud issue search and lookup.

use serde::Deserialize;
use serde_json::Value;

use super::atlassian::{escape_query, AtlassianClient, AtlassianCredentials};
use super::{Tool, ToolArgs, ToolError, ToolOutput};
use crate::constants::JIRA_SEARCH_DEFAULT_LIMIT;
use crate::schema::{ParamSpec, ToolSpec};

const ISSUE_FIELDS: &str = "summary,status,assignee,updated";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<Issue>,
}

#[derive(Deserialize)]
struct Issue {
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<Named>,
    #[serde(default)]
    assignee: Option<Person>,
    #[serde(default)]
    reporter: Option<Person>,
    #[serde(default)]
    priority: Option<Named>,
    /// Atlassian Document Format.
    #[serde(default)]
    description: Option<Value>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct Person {
    #[serde(rename = "displayName")]
    display_name: String,
}

fn person(p: &Option<Person>) -> &str {
    p.as_ref().map(|p| p.display_name.as_str()).unwrap_or("Unassigned")
}

fn named(n: &Option<Named>) -> &str {
    n.as_ref().map(|n| n.name.as_str()).unwrap_or("Unknown")
}

pub struct SearchJiraTool {
    client: AtlassianClient,
}

impl SearchJiraTool {
    pub fn new(credentials: Option<AtlassianCredentials>) -> Self {
        Self {
            client: AtlassianClient::new(credentials),
        }
    }
}

#[async_trait::async_trait]
impl Tool for SearchJiraTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("search_jira_issues")
            .description(
                "Searches Jira issues by text. An empty query returns the most recently updated issues.",
            )
            .param(ParamSpec::required("query", "str"))
            .param(ParamSpec::optional("limit", "int"))
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = args.opt_str("query").unwrap_or("").trim();
        let limit = args.u64_or("limit", JIRA_SEARCH_DEFAULT_LIMIT).clamp(1, 50);
        let jql = if query.is_empty() {
            "ORDER BY updated DESC".to_string()
        } else {
            format!("text ~ \"{}\" ORDER BY updated DESC", escape_query(query))
        };

        let response: SearchResponse = self
            .client
            .get_json(
                "/rest/api/3/search/jql",
                &[
                    ("jql", jql),
                    ("maxResults", limit.to_string()),
                    ("fields", ISSUE_FIELDS.to_string()),
                ],
            )
            .await?;

        if response.issues.is_empty() {
            return Ok("No Jira issues found matching your query.".into());
        }

        let lines: Vec<String> = response
            .issues
            .iter()
            .map(|issue| {
                format!(
                    "{} | {} | {} | Assignee: {}",
                    issue.key,
                    named(&issue.fields.status),
                    issue.fields.summary.as_deref().unwrap_or(""),
                    person(&issue.fields.assignee),
                )
            })
            .collect();
        Ok(lines.join("\n").into())
    }
}

pub struct GetJiraTicketTool {
    client: AtlassianClient,
}

impl GetJiraTicketTool {
    pub fn new(credentials: Option<AtlassianCredentials>) -> Self {
        Self {
            client: AtlassianClient::new(credentials),
        }
    }
}

#[async_trait::async_trait]
impl Tool for GetJiraTicketTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("get_jira_ticket")
            .description("Gets the details of a single Jira issue by key, e.g. PROJ-123.")
            .param(ParamSpec::required("issue_key", "str"))
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let key = args.str("issue_key")?.trim().to_uppercase();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ToolError::InvalidArgument(format!(
                "'{key}' is not a valid issue key"
            )));
        }

        let issue: Issue = self
            .client
            .get_json(
                &format!("/rest/api/3/issue/{key}"),
                &[(
                    "fields",
                    "summary,status,assignee,reporter,priority,description".to_string(),
                )],
            )
            .await?;

        let description = issue
            .fields
            .description
            .as_ref()
            .map(adf_to_text)
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "(no description)".to_string());

        let details = format!(
            "Key: {}\nSummary: {}\nStatus: {}\nPriority: {}\nAssignee: {}\nReporter: {}\nLink: {}/browse/{}\n--- DESCRIPTION ---\n{}",
            issue.key,
            issue.fields.summary.as_deref().unwrap_or(""),
            named(&issue.fields.status),
            named(&issue.fields.priority),
            person(&issue.fields.assignee),
            person(&issue.fields.reporter),
            self.client.server()?,
            issue.key,
            description.trim(),
        );
        Ok(details.into())
    }
}

/// Flattens an Atlassian Document Format tree to plain text, one line per
/// block node.
fn adf_to_text(node: &Value) -> String {
    fn walk(node: &Value, out: &mut String) {
        match node {
            Value::String(s) => out.push_str(s),
            Value::Object(map) => {
                if let Some(Value::String(text)) = map.get("text") {
                    out.push_str(text);
                }
                if map.get("type").and_then(Value::as_str) == Some("hardBreak") {
                    out.push('\n');
                }
                if let Some(Value::Array(children)) = map.get("content") {
                    for child in children {
                        walk(child, out);
                    }
                    let block = matches!(
                        map.get("type").and_then(Value::as_str),
                        Some("paragraph" | "heading" | "listItem" | "codeBlock" | "blockquote")
                    );
                    if block && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }

    let mut out = String::new();
    walk(node, &mut out);
    out
}
