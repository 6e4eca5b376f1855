//! Where switchboard keeps files on disk.
//!
//! Settings live under the platform config dir; readline history and the
//! Slack user-name cache live under the cache dir. Both are namespaced by
//! [`APP_NAME`].

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::types::Config;
use crate::constants::{APP_NAME, CONFIG_FILENAME, HISTORY_FILENAME, SLACK_USER_CACHE_FILENAME};

fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    base.map(|dir| dir.join(APP_NAME))
        .with_context(|| format!("Could not determine {kind} directory"))
}

impl Config {
    /// `~/.config/switchboard/` on Linux.
    pub fn config_dir() -> Result<PathBuf> {
        app_dir(dirs::config_dir(), "config")
    }

    /// `~/.cache/switchboard/` on Linux.
    pub fn cache_dir() -> Result<PathBuf> {
        app_dir(dirs::cache_dir(), "cache")
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Readline history for `switchboard chat`.
    pub fn history_path() -> Result<PathBuf> {
        Ok(Self::cache_dir()?.join(HISTORY_FILENAME))
    }

    /// Slack user id to real name map, kept between runs.
    pub fn slack_cache_path() -> Result<PathBuf> {
        Ok(Self::cache_dir()?.join(SLACK_USER_CACHE_FILENAME))
    }
}
