//! Shared Atlassian Cloud REST access for the Jira and Confluence tools.

use serde::de::DeserializeOwned;

use super::ToolError;

/// Site URL plus basic-auth credentials (account email + API token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlassianCredentials {
    pub server: String,
    pub email: String,
    pub api_token: String,
}

pub(crate) const MISSING_CREDENTIALS: &str =
    "Atlassian access (set JIRA_SERVER, JIRA_EMAIL and JIRA_API_TOKEN)";

/// Thin authenticated client over one Atlassian site.
pub struct AtlassianClient {
    credentials: Option<AtlassianCredentials>,
    http: reqwest::Client,
}

impl AtlassianClient {
    pub fn new(credentials: Option<AtlassianCredentials>) -> Self {
        Self {
            credentials: credentials.map(|mut c| {
                c.server = c.server.trim_end_matches('/').to_string();
                c
            }),
            http: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<&AtlassianCredentials, ToolError> {
        self.credentials
            .as_ref()
            .ok_or_else(|| ToolError::NotConfigured(MISSING_CREDENTIALS.to_string()))
    }

    /// Site base URL without a trailing slash.
    pub fn server(&self) -> Result<&str, ToolError> {
        Ok(self.credentials()?.server.as_str())
    }

    /// GET `<server><path>` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ToolError> {
        let creds = self.credentials()?;
        let url = format!("{}{}", creds.server, path);
        tracing::debug!(url = %url, "calling Atlassian API");

        let response = self
            .http
            .get(&url)
            .basic_auth(&creds.email, Some(&creds.api_token))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Failed(format!(
                "Atlassian API error (HTTP {}): {}",
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(response.json().await?)
    }
}

/// Quotes a user query for use inside a JQL/CQL string literal.
pub(crate) fn escape_query(query: &str) -> String {
    query.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
pub(crate) fn test_credentials(server: &str) -> Option<AtlassianCredentials> {
    Some(AtlassianCredentials {
        server: server.to_string(),
        email: "dev@example.com".to_string(),
        api_token: "token".to_string(),
    })
}
