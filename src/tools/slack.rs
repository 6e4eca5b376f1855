//! Keyword search over the user's recent Slack history.
//!
//! Walks every conversation the user is a member of, scans the most recent
//! messages of each, and keeps case-insensitive substring matches. User ids
//! are resolved to real names through a per-process cache.

use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::{Tool, ToolArgs, ToolError, ToolOutput};
use crate::constants::{
    SLACK_API_BASE_URL, SLACK_CHANNEL_PAGE_SIZE, SLACK_HISTORY_PER_CHANNEL, SLACK_MAX_MATCHES,
};
use crate::schema::{ParamSpec, ToolSpec};

/// Every Web API response carries `ok` and, on failure, `error`.
#[derive(Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: Option<T>,
}

#[derive(Deserialize)]
struct ChannelPage {
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Deserialize)]
struct Channel {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct History {
    #[serde(default)]
    messages: Vec<SlackMessage>,
}

#[derive(Deserialize)]
struct SlackMessage {
    #[serde(default)]
    text: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    ts: String,
}

#[derive(Deserialize)]
struct UserInfo {
    user: UserProfile,
}

#[derive(Deserialize)]
struct UserProfile {
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

pub struct SearchSlackTool {
    token: Option<String>,
    base_url: String,
    http: reqwest::Client,
    /// User id -> real name.
    names: Mutex<HashMap<String, String>>,
    /// Where resolved names are kept between runs.
    cache_file: Option<PathBuf>,
}

impl SearchSlackTool {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(token, SLACK_API_BASE_URL)
    }

    pub fn with_base_url(token: Option<String>, base_url: &str) -> Self {
        Self {
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            names: Mutex::new(HashMap::new()),
            cache_file: None,
        }
    }

    /// Seed the name cache from `path` and write new names back to it.
    ///
    /// A missing or unreadable file starts an empty cache.
    pub fn with_cache_file(mut self, path: PathBuf) -> Self {
        self.names = Mutex::new(load_names(&path));
        self.cache_file = Some(path);
        self
    }

    async fn api<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, ToolError> {
        let token = self.token.as_deref().ok_or_else(|| {
            ToolError::NotConfigured("Slack access (set SLACK_USER_TOKEN)".to_string())
        })?;
        let url = format!("{}/{}", self.base_url, method);
        debug!(method, "calling Slack API");

        let envelope: Envelope<T> = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match envelope {
            Envelope {
                ok: true,
                body: Some(body),
                ..
            } => Ok(body),
            Envelope { error, .. } => Err(ToolError::Failed(format!(
                "Slack API error in {method}: {}",
                error.unwrap_or_else(|| "unknown_error".to_string())
            ))),
        }
    }

    async fn member_channels(&self) -> Result<Vec<Channel>, ToolError> {
        let mut channels = Vec::new();
        let mut cursor = String::new();
        loop {
            let mut query = vec![
                ("types", "public_channel,private_channel,im,mpim".to_string()),
                ("limit", SLACK_CHANNEL_PAGE_SIZE.to_string()),
            ];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }
            let page: ChannelPage = self.api("conversations.list", &query).await?;
            channels.extend(page.channels);
            cursor = page
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                return Ok(channels);
            }
        }
    }

    async fn real_name(&self, user_id: Option<&str>) -> String {
        let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
            return "Unknown".to_string();
        };
        if let Some(name) = self.cached_name(user_id) {
            return name;
        }

        let resolved = self
            .api::<UserInfo>("users.info", &[("user", user_id.to_string())])
            .await
            .ok()
            .and_then(|info| info.user.real_name.or(info.user.name))
            .filter(|n| !n.is_empty());

        match resolved {
            Some(name) => {
                let snapshot = match self.names.lock() {
                    Ok(mut names) => {
                        names.insert(user_id.to_string(), name.clone());
                        serde_json::to_vec(&*names).ok()
                    }
                    Err(_) => None,
                };
                if let (Some(path), Some(bytes)) = (&self.cache_file, snapshot) {
                    save_names(path, &bytes).await;
                }
                name
            }
            None => user_id.to_string(),
        }
    }

    fn cached_name(&self, user_id: &str) -> Option<String> {
        self.names.lock().ok()?.get(user_id).cloned()
    }
}

#[async_trait::async_trait]
impl Tool for SearchSlackTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("search_slack")
            .description(
                "Searches the user's Slack history for a specific keyword or phrase. \
                 Useful for finding past discussions, requirements, or decisions.",
            )
            .param(ParamSpec::required("query", "str"))
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = args.str("query")?.trim().to_lowercase();
        if query.is_empty() {
            return Err(ToolError::InvalidArgument(
                "query must not be empty".to_string(),
            ));
        }

        let mut matches = Vec::new();
        'channels: for channel in self.member_channels().await? {
            let history = match self
                .api::<History>(
                    "conversations.history",
                    &[
                        ("channel", channel.id.clone()),
                        ("limit", SLACK_HISTORY_PER_CHANNEL.to_string()),
                    ],
                )
                .await
            {
                Ok(h) => h,
                Err(e) => {
                    debug!(channel = %channel.id, err = %e, "skipping unreadable channel");
                    continue;
                }
            };

            let channel_name = channel
                .name
                .clone()
                .unwrap_or_else(|| format!("DM ({})", channel.id));
            for msg in history.messages {
                if !msg.text.to_lowercase().contains(&query) {
                    continue;
                }
                let user = self.real_name(msg.user.as_deref()).await;
                matches.push(format!(
                    "[{}] Channel: #{} | User: {} | Msg: {}",
                    format_ts(&msg.ts),
                    channel_name,
                    user,
                    msg.text
                ));
                if matches.len() >= SLACK_MAX_MATCHES {
                    break 'channels;
                }
            }
        }

        if matches.is_empty() {
            return Ok("No Slack messages found matching that query.".into());
        }
        Ok(matches.join("\n").into())
    }
}

fn load_names(path: &Path) -> HashMap<String, String> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(path = %path.display(), err = %e, "ignoring corrupt Slack user cache");
        HashMap::new()
    })
}

async fn save_names(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    if let Err(e) = tokio::fs::write(path, bytes).await {
        warn!(path = %path.display(), err = %e, "failed to save Slack user cache");
    }
}

/// Renders a Slack `ts` ("1700000000.000100") in local time.
fn format_ts(ts: &str) -> String {
    let seconds = ts
        .split('.')
        .next()
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    match seconds {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %I:%M %p")
            .to_string(),
        None => ts.to_string(),
    }
}
