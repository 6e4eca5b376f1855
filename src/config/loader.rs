//! File loading and merging for switchboard configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::{default_model, Config, ProviderSettings, ToolSettings};

/// Written on first run so users have a template to edit.
const DEFAULT_CONFIG_TOML: &str = r#"model = "openai/gpt-4o"

[provider]
base_url = "https://openrouter.ai/api/v1"
api_key = "{env:OPENROUTER_API_KEY}"
site_url = "http://localhost:8000"
site_name = "Context Co"
timeout_secs = 120

[tools]
timeout_secs = 60

[jira]
server = "{env:JIRA_SERVER}"
email = "{env:JIRA_EMAIL}"
api_token = "{env:JIRA_API_TOKEN}"

[slack]
user_token = "{env:SLACK_USER_TOKEN}"
"#;

impl Config {
    /// Loads the global config from `~/.config/switchboard/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for credentials) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, DEFAULT_CONFIG_TOML)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            return toml::from_str(DEFAULT_CONFIG_TOML)
                .with_context(|| "Failed to parse default config".to_string());
        }
        Self::load_file(&path)
    }

    /// Look for switchboard.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub(super) fn load_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            system_prompt: project.system_prompt.or(global.system_prompt),
            provider: ProviderSettings {
                base_url: project.provider.base_url.or(global.provider.base_url),
                api_key: project.provider.api_key.or(global.provider.api_key),
                site_url: project.provider.site_url.or(global.provider.site_url),
                site_name: project.provider.site_name.or(global.provider.site_name),
                timeout_secs: project.provider.timeout_secs.or(global.provider.timeout_secs),
            },
            tools: ToolSettings {
                root: project.tools.root.or(global.tools.root),
                timeout_secs: project.tools.timeout_secs.or(global.tools.timeout_secs),
            },
            jira: project.jira.or(global.jira),
            slack: project.slack.or(global.slack),
        }
    }
}
