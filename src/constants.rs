//! Centralized constants for switchboard.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "switchboard";

/// Default model identifier, as understood by OpenRouter.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "switchboard.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

// --- Provider defaults ---

/// Base URL of the OpenAI-compatible chat completions API.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Environment variable consulted first for the provider API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Sent as `HTTP-Referer` to identify the calling site.
pub const DEFAULT_SITE_URL: &str = "http://localhost:8000";

/// Sent as `X-Title` to identify the calling site.
pub const DEFAULT_SITE_NAME: &str = "Context Co";

/// Deadline for a single provider round-trip.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;

// --- Orchestration ---

/// Hard upper bound on provider round-trips per user turn.
pub const MAX_TURN_ITERATIONS: usize = 10;

/// Deadline for a single tool dispatch.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

/// Description used for capabilities registered without one.
pub const NO_DESCRIPTION: &str = "No description provided.";

// --- Tool limits ---

/// Maximum file size (bytes) the read_file tool will read.
pub const READ_FILE_MAX_SIZE: u64 = 100 * 1024;

/// Byte threshold for binary file detection (check first N bytes for null).
pub const BINARY_DETECTION_BYTES: usize = 8192;

/// Maximum number of results the list_files tool returns.
pub const LIST_FILES_MAX_RESULTS: usize = 1000;

/// Total bytes of source the read_all_code_files tool returns.
pub const CODE_DUMP_MAX_BYTES: usize = 200 * 1024;

/// Extensions the read_all_code_files tool treats as source code.
pub const CODE_FILE_EXTENSIONS: &[&str] = &[
    "rs", "py", "ts", "tsx", "js", "jsx", "go", "java", "kt", "c", "h", "cpp", "hpp", "cs",
    "rb", "php", "swift", "scala", "sh", "sql", "toml", "yaml", "yml", "json", "md",
];

/// Directories never descended into when collecting source files.
pub const IGNORED_DIRS: &[&str] = &[
    ".git", "target", "node_modules", "dist", "build", ".venv", "venv", "__pycache__",
];

/// Number of pages returned by a Confluence search.
pub const CONFLUENCE_SEARCH_LIMIT: usize = 5;

/// Characters of page text kept by get_confluence_page.
pub const CONFLUENCE_PAGE_MAX_CHARS: usize = 500;

/// Default number of issues returned by a Jira search.
pub const JIRA_SEARCH_DEFAULT_LIMIT: u64 = 10;

/// Recent messages scanned per Slack conversation.
pub const SLACK_HISTORY_PER_CHANNEL: u32 = 20;

/// Maximum Slack matches returned to the provider.
pub const SLACK_MAX_MATCHES: usize = 15;

/// Page size for Slack's conversations.list.
pub const SLACK_CHANNEL_PAGE_SIZE: u32 = 200;

/// File under the cache dir holding resolved Slack user names.
pub const SLACK_USER_CACHE_FILENAME: &str = "slack_users_cache.json";

/// Base URL of the Slack Web API.
pub const SLACK_API_BASE_URL: &str = "https://slack.com/api";
