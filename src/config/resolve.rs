//! Environment variable substitution and derived settings.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use super::types::Config;
use crate::constants::{
    API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_SITE_NAME,
    DEFAULT_SITE_URL, DEFAULT_TOOL_TIMEOUT_SECS,
};
use crate::tools::atlassian::AtlassianCredentials;

const MASK: &str = "********";

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        resolve_opt(&mut self.system_prompt);

        let p = &mut self.provider;
        for field in [&mut p.base_url, &mut p.api_key, &mut p.site_url, &mut p.site_name] {
            resolve_opt(field);
        }
        if let Some(ref mut jira) = self.jira {
            for field in [&mut jira.server, &mut jira.email, &mut jira.api_token] {
                resolve_opt(field);
            }
        }
        if let Some(ref mut slack) = self.slack {
            resolve_opt(&mut slack.user_token);
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    pub(super) fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        while let Some(start) = result.find("{env:") {
            if let Some(end) = result[start..].find('}') {
                let var_name = &result[start + 5..start + end];
                let value = std::env::var(var_name).unwrap_or_default();
                result = format!(
                    "{}{}{}",
                    &result[..start],
                    value,
                    &result[start + end + 1..]
                );
            } else {
                break;
            }
        }
        result
    }

    /// Resolve the provider API key: env var first, then config value.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Ok(val) = std::env::var(API_KEY_ENV) {
            if !val.is_empty() {
                return Some(val);
            }
        }
        non_empty(&self.provider.api_key)
    }

    /// Like [`Config::resolve_api_key`], but an error naming where to set it.
    pub fn require_api_key(&self) -> Result<String> {
        self.resolve_api_key().with_context(|| {
            format!(
                "No provider API key found. Set {API_KEY_ENV} or provider.api_key in {}",
                Self::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_string())
            )
        })
    }

    pub fn base_url(&self) -> String {
        non_empty(&self.provider.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn site_url(&self) -> String {
        non_empty(&self.provider.site_url).unwrap_or_else(|| DEFAULT_SITE_URL.to_string())
    }

    pub fn site_name(&self) -> String {
        non_empty(&self.provider.site_name).unwrap_or_else(|| DEFAULT_SITE_NAME.to_string())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(
            self.provider
                .timeout_secs
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
        )
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.timeout_secs.unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS))
    }

    /// Workspace root for the file tools.
    pub fn tools_root(&self) -> Result<PathBuf> {
        match &self.tools.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    /// Atlassian credentials, present only when all three values are set.
    pub fn jira_credentials(&self) -> Option<AtlassianCredentials> {
        let jira = self.jira.as_ref()?;
        Some(AtlassianCredentials {
            server: non_empty(&jira.server)?,
            email: non_empty(&jira.email)?,
            api_token: non_empty(&jira.api_token)?,
        })
    }

    pub fn slack_token(&self) -> Option<String> {
        self.slack.as_ref().and_then(|s| non_empty(&s.user_token))
    }

    /// A copy safe to print: secrets replaced by a mask.
    pub fn masked(&self) -> Config {
        let mut shown = self.clone();
        mask(&mut shown.provider.api_key);
        if let Some(ref mut jira) = shown.jira {
            mask(&mut jira.api_token);
        }
        if let Some(ref mut slack) = shown.slack {
            mask(&mut slack.user_token);
        }
        shown
    }
}

fn resolve_opt(field: &mut Option<String>) {
    if let Some(ref mut value) = field {
        *value = Config::resolve_str(value);
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn mask(field: &mut Option<String>) {
    if field.as_deref().is_some_and(|s| !s.is_empty()) {
        *field = Some(MASK.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{JiraSettings, SlackSettings};

    #[test]
    fn substitutes_env_placeholders() {
        std::env::set_var("SWITCHBOARD_TEST_SUBST", "secret");
        assert_eq!(
            Config::resolve_str("Bearer {env:SWITCHBOARD_TEST_SUBST}!"),
            "Bearer secret!"
        );
        assert_eq!(Config::resolve_str("{env:SWITCHBOARD_TEST_UNSET_VAR}"), "");
        assert_eq!(Config::resolve_str("{env:UNTERMINATED"), "{env:UNTERMINATED");
    }

    #[test]
    fn jira_credentials_need_all_fields() {
        let mut config = Config {
            jira: Some(JiraSettings {
                server: Some("https://acme.atlassian.net".into()),
                email: Some("dev@acme.io".into()),
                api_token: Some(String::new()),
            }),
            ..Config::default()
        };
        assert!(config.jira_credentials().is_none());
        if let Some(ref mut jira) = config.jira {
            jira.api_token = Some("tok".into());
        }
        assert_eq!(config.jira_credentials().unwrap().email, "dev@acme.io");
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.site_name(), DEFAULT_SITE_NAME);
        assert_eq!(config.tool_timeout(), Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS));
        assert!(config.slack_token().is_none());
    }

    #[test]
    fn masked_hides_secrets() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-or-v1-abc".into());
        config.slack = Some(SlackSettings {
            user_token: Some("xoxp-1".into()),
        });
        let shown = config.masked();
        assert_eq!(shown.provider.api_key.as_deref(), Some(MASK));
        assert_eq!(shown.slack.unwrap().user_token.as_deref(), Some(MASK));
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-or-v1-abc"));
    }
}
