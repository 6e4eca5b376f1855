//! Bulk read of the workspace's source files.

use std::path::{Path, PathBuf};

use super::{Tool, ToolArgs, ToolError, ToolOutput};
use crate::constants::{CODE_DUMP_MAX_BYTES, CODE_FILE_EXTENSIONS, IGNORED_DIRS};
use crate::schema::ToolSpec;

pub struct ReadAllCodeFilesTool {
    root: PathBuf,
}

impl ReadAllCodeFilesTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait::async_trait]
impl Tool for ReadAllCodeFilesTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("read_all_code_files").description(
            "Reads every source file in the workspace and returns them concatenated, \
             each under a header with its relative path.",
        )
    }

    async fn call(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let root = self.root.clone();
        let dump = tokio::task::spawn_blocking(move || collect(&root)).await??;
        Ok(dump.into())
    }
}

fn is_code_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CODE_FILE_EXTENSIONS.contains(&ext))
}

fn is_ignored(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| IGNORED_DIRS.contains(&c.as_os_str().to_string_lossy().as_ref()))
}

/// Walks the workspace in path order and concatenates source files until
/// the byte budget is spent. Files that are not UTF-8 are skipped.
fn collect(root: &Path) -> Result<String, ToolError> {
    let pattern = root.join("**/*");
    let entries = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid glob pattern: {e}")))?;

    let mut out = String::new();
    let mut files = 0usize;
    for entry in entries.flatten() {
        let relative = entry.strip_prefix(root).unwrap_or(&entry).to_path_buf();
        if is_ignored(&relative) || !entry.is_file() || !is_code_file(&entry) {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&entry) else {
            continue;
        };
        let section = format!("--- {} ---\n{}\n", relative.display(), text.trim_end());
        if out.len() + section.len() > CODE_DUMP_MAX_BYTES {
            out.push_str(&format!(
                "... [TRUNCATED after {files} files; use read_file for the rest] ..."
            ));
            return Ok(out);
        }
        out.push_str(&section);
        files += 1;
    }

    if files == 0 {
        return Ok("No source files found in the workspace.".to_string());
    }
    Ok(out.trim_end().to_string())
}
