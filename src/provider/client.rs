//! HTTP client for OpenAI-compatible chat completions.
//!
//! Sends the full conversation and the tool descriptors on every call and
//! maps `choices[0].message` onto a [`ProviderReply`]. Non-streaming: the
//! tool loop needs the complete message before it can dispatch anything.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatProvider, ProviderError, ProviderReply};
use crate::config::Config;
use crate::message::{Message, ToolCallRequest};
use crate::schema::ToolDescriptor;

/// A configured chat-completions endpoint ready to handle requests.
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    site_url: String,
    site_name: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDescriptor],
}

fn no_tools(tools: &&[ToolDescriptor]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallRequest>>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl OpenRouterClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            site_url: crate::constants::DEFAULT_SITE_URL.to_string(),
            site_name: crate::constants::DEFAULT_SITE_NAME.to_string(),
        }
    }

    /// Identifies the calling site via `HTTP-Referer` and `X-Title`.
    pub fn with_site(mut self, url: impl Into<String>, name: impl Into<String>) -> Self {
        self.site_url = url.into();
        self.site_name = name.into();
        self
    }

    /// Creates a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(config.base_url(), api_key, config.model.clone())
            .with_site(config.site_url(), config.site_name()))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl From<ResponseMessage> for ProviderReply {
    fn from(message: ResponseMessage) -> Self {
        match message.tool_calls {
            Some(calls) if !calls.is_empty() => ProviderReply::ToolCalls {
                content: message.content.filter(|c| !c.is_empty()),
                calls,
            },
            _ => ProviderReply::Final(message.content.unwrap_or_default()),
        }
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenRouterClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ProviderReply, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            tools,
        };
        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "calling chat completions"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_name)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let text = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        if let Some(err) = parsed.error {
            return Err(ProviderError::Api(err.message));
        }
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("response has no choices".to_string()))?;
        Ok(choice.message.into())
    }
}
