pub mod args;
pub mod atlassian;
pub mod code_files;
pub mod confluence;
pub mod jira;
pub mod list_files;
pub mod read_file;
pub mod slack;

use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::schema::{self, ToolDescriptor, ToolSpec};

pub use args::ToolArgs;

use code_files::ReadAllCodeFilesTool;
use confluence::{GetConfluencePageTool, SearchConfluenceTool};
use jira::{GetJiraTicketTool, SearchJiraTool};
use list_files::ListFilesTool;
use read_file::ReadFileTool;
use slack::SearchSlackTool;

/// What a capability hands back on success. Always coerced to text before
/// it enters the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
}

impl ToolOutput {
    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Text(s) => s,
            ToolOutput::Json(Value::String(s)) => s,
            ToolOutput::Json(v) => v.to_string(),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(s: String) -> Self {
        ToolOutput::Text(s)
    }
}

impl From<&str> for ToolOutput {
    fn from(s: &str) -> Self {
        ToolOutput::Text(s.to_string())
    }
}

impl From<Value> for ToolOutput {
    fn from(v: Value) -> Self {
        ToolOutput::Json(v)
    }
}

/// Failure reported by a capability.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Failed(String),
}

/// Every capability implements this trait.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Declarative name, description and parameter list.
    fn spec(&self) -> ToolSpec;

    /// Execute the capability with already-parsed keyword arguments.
    async fn call(&self, args: ToolArgs) -> Result<ToolOutput, ToolError>;
}

/// Holds all registered tools and dispatches calls by name.
///
/// Built once through [`ToolRegistryBuilder`]; read-only afterwards.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
    timeout: Duration,
}

/// Collects capabilities and generates their descriptors.
pub struct ToolRegistryBuilder {
    registry: ToolRegistry,
}

impl ToolRegistryBuilder {
    /// Deadline applied to every dispatch.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.registry.timeout = timeout;
        self
    }

    /// Register a tool. A tool whose schema cannot be generated, or whose
    /// name is already taken, is skipped without affecting the others.
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        let spec = tool.spec();
        let descriptor = match schema::generate(&spec) {
            Ok(d) => d,
            Err(e) => {
                warn!(tool = %spec.name, err = %e, "skipping tool with invalid schema");
                return self;
            }
        };
        if self.registry.index.contains_key(&descriptor.name) {
            warn!(tool = %descriptor.name, "skipping duplicate tool registration");
            return self;
        }
        debug!(tool = %descriptor.name, params = descriptor.parameters.len(), "registered tool");
        let registry = &mut self.registry;
        registry
            .index
            .insert(descriptor.name.clone(), registry.tools.len());
        registry.tools.push(Arc::new(tool));
        registry.descriptors.push(descriptor);
        self
    }

    pub fn build(self) -> ToolRegistry {
        self.registry
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder {
            registry: Self {
                tools: Vec::new(),
                descriptors: Vec::new(),
                index: HashMap::new(),
                timeout: Duration::from_secs(crate::constants::DEFAULT_TOOL_TIMEOUT_SECS),
            },
        }
    }

    /// Descriptors for the provider, in registration order.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// How many tools are registered.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up a tool by name and execute it, returning the text fed back
    /// to the provider.
    ///
    /// Never fails: unknown names, capability errors, panics and deadline
    /// expiry all come back as descriptive result text.
    pub async fn dispatch(&self, name: &str, raw_arguments: &str) -> String {
        let Some(&slot) = self.index.get(name) else {
            warn!(tool = name, "provider requested an unregistered tool");
            return format!("Error: Tool '{name}' not found.");
        };
        let tool = Arc::clone(&self.tools[slot]);
        let args = ToolArgs::parse(raw_arguments);

        info!(tool = name, "dispatching tool");
        let call = AssertUnwindSafe(tool.call(args)).catch_unwind();
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(output))) => output.into_text(),
            Ok(Ok(Err(e))) => {
                info!(tool = name, err = %e, "tool returned an error");
                format!("Tool Error: {e}")
            }
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                warn!(tool = name, panic = %message, "tool panicked");
                format!("Tool Error: {message}")
            }
            Err(_) => {
                warn!(tool = name, timeout = ?self.timeout, "tool timed out");
                format!("Tool Error: timed out after {:?}", self.timeout)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

impl ToolRegistry {
    /// Create a registry with all bundled tools, wired from config.
    pub fn with_builtins(config: &Config) -> anyhow::Result<Self> {
        let root = config.tools_root()?;
        let jira = config.jira_credentials();
        let mut slack = SearchSlackTool::new(config.slack_token());
        if let Ok(path) = Config::slack_cache_path() {
            slack = slack.with_cache_file(path);
        }

        Ok(Self::builder()
            .timeout(config.tool_timeout())
            .register(ListFilesTool::new(root.clone()))
            .register(ReadAllCodeFilesTool::new(root.clone()))
            .register(ReadFileTool::new(root))
            .register(SearchJiraTool::new(jira.clone()))
            .register(GetJiraTicketTool::new(jira.clone()))
            .register(SearchConfluenceTool::new(jira.clone()))
            .register(GetConfluencePageTool::new(jira))
            .register(slack)
            .build())
    }
}
