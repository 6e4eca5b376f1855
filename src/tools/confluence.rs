//! Confluence page search and retrieval.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use super::atlassian::{escape_query, AtlassianClient, AtlassianCredentials};
use super::{Tool, ToolArgs, ToolError, ToolOutput};
use crate::constants::{CONFLUENCE_PAGE_MAX_CHARS, CONFLUENCE_SEARCH_LIMIT};
use crate::schema::{ParamSpec, ToolSpec};

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    id: String,
    title: String,
    #[serde(rename = "_links", default)]
    links: Links,
    #[serde(default)]
    body: Option<Body>,
}

#[derive(Deserialize, Default)]
struct Links {
    #[serde(default)]
    webui: String,
}

#[derive(Deserialize)]
struct Body {
    storage: Storage,
}

#[derive(Deserialize)]
struct Storage {
    value: String,
}

pub struct SearchConfluenceTool {
    client: AtlassianClient,
}

impl SearchConfluenceTool {
    pub fn new(credentials: Option<AtlassianCredentials>) -> Self {
        Self {
            client: AtlassianClient::new(credentials),
        }
    }
}

#[async_trait::async_trait]
impl Tool for SearchConfluenceTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("search_confluence_pages")
            .description(
                "Searches Confluence for pages. If query is empty, returns recently updated pages.",
            )
            .param(ParamSpec::optional("query", "str"))
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = args.opt_str("query").unwrap_or("").trim();
        let cql = if query.is_empty() {
            "type in (page, blogpost) ORDER BY lastModified DESC".to_string()
        } else {
            format!(
                "type in (page, blogpost) AND text ~ \"{}\"",
                escape_query(query)
            )
        };

        let response: SearchResponse = self
            .client
            .get_json(
                "/wiki/rest/api/search",
                &[("cql", cql), ("limit", CONFLUENCE_SEARCH_LIMIT.to_string())],
            )
            .await?;

        if response.results.is_empty() {
            return Ok("No Confluence pages found matching your query.".into());
        }

        let server = self.client.server()?;
        let lines: Vec<String> = response
            .results
            .iter()
            .take(CONFLUENCE_SEARCH_LIMIT)
            .map(|hit| {
                format!(
                    "Page ID: {} | Title: {} | Link: {}/wiki{}",
                    hit.content.id, hit.content.title, server, hit.content.links.webui
                )
            })
            .collect();
        Ok(lines.join("\n").into())
    }
}

pub struct GetConfluencePageTool {
    client: AtlassianClient,
}

impl GetConfluencePageTool {
    pub fn new(credentials: Option<AtlassianCredentials>) -> Self {
        Self {
            client: AtlassianClient::new(credentials),
        }
    }
}

#[async_trait::async_trait]
impl Tool for GetConfluencePageTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("get_confluence_page")
            .description("Gets the text content of a Confluence page.")
            .param(ParamSpec::required("page_id", "str"))
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let page_id = args.str("page_id")?.trim();
        if page_id.is_empty() || !page_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ToolError::InvalidArgument(format!(
                "'{page_id}' is not a valid page id"
            )));
        }

        let page: Content = self
            .client
            .get_json(
                &format!("/wiki/rest/api/content/{page_id}"),
                &[("expand", "body.storage".to_string())],
            )
            .await?;

        let html = page.body.map(|b| b.storage.value).unwrap_or_default();
        let text = page_text(&html);

        Ok(format!(
            "Title: {}\nLink: {}/wiki{}\n--- CONTENT ---\n{}",
            page.title,
            self.client.server()?,
            page.links.webui,
            text
        )
        .into())
    }
}

/// Strips markup, truncates, and drops blank lines.
fn page_text(html: &str) -> String {
    let mut text = strip_html(html);
    if text.chars().count() > CONFLUENCE_PAGE_MAX_CHARS {
        text = text.chars().take(CONFLUENCE_PAGE_MAX_CHARS).collect();
        text.push_str("\n... [CONTENT TRUNCATED] ...");
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_html(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"));
    let text = tag.replace_all(html, "\n");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::atlassian::test_credentials;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn strips_markup_and_blank_lines() {
        let html = "<h1>Runbook</h1><p>Restart the <b>api</b> &amp; check logs.</p><p></p>";
        assert_eq!(page_text(html), "Runbook\nRestart the\napi\n& check logs.");
    }

    #[test]
    fn truncates_long_pages() {
        let html = format!("<p>{}</p>", "x".repeat(CONFLUENCE_PAGE_MAX_CHARS * 2));
        let text = page_text(&html);
        assert!(text.ends_with("... [CONTENT TRUNCATED] ..."));
        assert!(text.len() < CONFLUENCE_PAGE_MAX_CHARS + 40);
    }

    #[tokio::test]
    async fn empty_query_lists_recent_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/rest/api/search"))
            .and(query_param(
                "cql",
                "type in (page, blogpost) ORDER BY lastModified DESC",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "content": { "id": "42", "title": "Onboarding", "_links": { "webui": "/spaces/ENG/pages/42" } } }
                ]
            })))
            .mount(&server)
            .await;

        let tool = SearchConfluenceTool::new(test_credentials(&server.uri()));
        let out = tool.call(ToolArgs::default()).await.unwrap().into_text();
        assert_eq!(
            out,
            format!(
                "Page ID: 42 | Title: Onboarding | Link: {}/wiki/spaces/ENG/pages/42",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn fetches_page_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/rest/api/content/42"))
            .and(query_param("expand", "body.storage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42",
                "title": "Onboarding",
                "_links": { "webui": "/spaces/ENG/pages/42" },
                "body": { "storage": { "value": "<p>Welcome aboard</p>" } }
            })))
            .mount(&server)
            .await;

        let tool = GetConfluencePageTool::new(test_credentials(&server.uri()));
        let out = tool
            .call(ToolArgs::parse(r#"{"page_id": "42"}"#))
            .await
            .unwrap()
            .into_text();
        assert!(out.starts_with("Title: Onboarding\n"));
        assert!(out.ends_with("--- CONTENT ---\nWelcome aboard"));
    }

    #[tokio::test]
    async fn unconfigured_search_is_an_error() {
        let tool = SearchConfluenceTool::new(None);
        let err = tool.call(ToolArgs::default()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured(_)));
    }
}
