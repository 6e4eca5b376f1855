use std::path::{Path, PathBuf};

use super::{Tool, ToolArgs, ToolError, ToolOutput};
use crate::constants::LIST_FILES_MAX_RESULTS;
use crate::schema::{ParamSpec, ToolSpec};

const DEFAULT_PATTERN: &str = "**/*";

pub struct ListFilesTool {
    root: PathBuf,
}

impl ListFilesTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait::async_trait]
impl Tool for ListFilesTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("list_files")
            .description(
                "Lists files in the workspace matching a glob pattern (default: every file).",
            )
            .param(ParamSpec::optional("pattern", "str"))
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let pattern = args
            .opt_str("pattern")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PATTERN);
        if pattern.split(['/', '\\']).any(|part| part == "..") {
            return Err(ToolError::InvalidArgument(
                "Pattern must stay inside the workspace".into(),
            ));
        }

        let root = self.root.clone();
        let pattern = pattern.to_string();
        let listing = tokio::task::spawn_blocking(move || walk(&root, &pattern)).await??;
        Ok(listing.into())
    }
}

/// Runs the glob walk. Synchronous, so callers move it off the runtime.
fn walk(root: &Path, pattern: &str) -> Result<String, ToolError> {
    let full_pattern = root.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();
    let root_canonical = root.canonicalize()?;

    let entries = glob::glob(&pattern_str)
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid glob pattern: {e}")))?;

    let mut paths: Vec<String> = Vec::new();
    for entry in entries.flatten() {
        if paths.len() >= LIST_FILES_MAX_RESULTS {
            paths.push(format!("... truncated at {LIST_FILES_MAX_RESULTS} results"));
            break;
        }
        if !entry.is_file() {
            continue;
        }
        // Skip entries outside the root and broken symlinks
        match entry.canonicalize() {
            Ok(canonical) if canonical.starts_with(&root_canonical) => {}
            _ => continue,
        }
        let relative = entry.strip_prefix(root).unwrap_or(&entry);
        paths.push(relative.display().to_string());
    }

    if paths.is_empty() {
        Ok("No files matched the pattern.".to_string())
    } else {
        Ok(paths.join("\n"))
    }
}
