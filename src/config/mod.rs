//! Configuration types and path resolution for switchboard.
//!
//! Switchboard stores its settings as TOML at the platform's XDG config path
//! (e.g. `~/.config/switchboard/config.toml` on Linux). A `switchboard.toml`
//! found between the current directory and the git root overrides it.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::Config;

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project()?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        tracing::debug!(model = %config.model, "config loaded");
        Ok(config)
    }

    /// A config with only defaults, rooted at `root`, with no credentials.
    #[cfg(test)]
    pub fn for_root(root: &std::path::Path) -> Self {
        let mut config = Self::default();
        config.tools.root = Some(root.to_path_buf());
        config
    }
}
