//! Struct definitions and serde defaults for switchboard configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for switchboard, deserialized from `config.toml`.
///
/// Fields use serde defaults so switchboard can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Provider model identifier (e.g. `"openai/gpt-4o"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Optional system prompt seeded as the first message of a conversation.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Chat-completions endpoint settings.
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Tool dispatch settings.
    #[serde(default)]
    pub tools: ToolSettings,
    /// Atlassian site shared by the Jira and Confluence tools.
    #[serde(default)]
    pub jira: Option<JiraSettings>,
    /// Slack Web API access for the search_slack tool.
    #[serde(default)]
    pub slack: Option<SlackSettings>,
}

/// Returns the default model identifier.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

/// Connection details for the chat-completions provider.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderSettings {
    /// API base URL; `/chat/completions` is appended.
    pub base_url: Option<String>,
    /// Bearer token. `OPENROUTER_API_KEY` takes precedence.
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer`.
    pub site_url: Option<String>,
    /// Sent as `X-Title`.
    pub site_name: Option<String>,
    /// Deadline for one provider round-trip.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ToolSettings {
    /// Workspace root for the file tools. Defaults to the current directory.
    pub root: Option<PathBuf>,
    /// Deadline for one tool dispatch.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct JiraSettings {
    /// Site URL, e.g. `https://example.atlassian.net`.
    pub server: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SlackSettings {
    /// User token (`xoxp-...`) with search and history scopes.
    pub user_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_prompt: None,
            provider: ProviderSettings::default(),
            tools: ToolSettings::default(),
            jira: None,
            slack: None,
        }
    }
}
