use std::path::{Path, PathBuf};

use super::{Tool, ToolArgs, ToolError, ToolOutput};
use crate::constants::{BINARY_DETECTION_BYTES, READ_FILE_MAX_SIZE};
use crate::schema::{ParamSpec, ToolSpec};

pub struct ReadFileTool {
    /// Workspace root. Paths are resolved relative to this.
    root: PathBuf,
}

impl ReadFileTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

/// Resolve and validate that the path stays within the workspace root.
/// Touches the filesystem synchronously.
fn resolve_path(root: &Path, path: &str) -> Result<PathBuf, ToolError> {
    let resolved = if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        root.join(path)
    };
    let canonical = resolved.canonicalize()?;
    let root_canonical = root.canonicalize()?;
    if !canonical.starts_with(&root_canonical) {
        return Err(ToolError::InvalidArgument(format!(
            "Path escapes workspace directory: {path}"
        )));
    }
    Ok(canonical)
}

#[async_trait::async_trait]
impl Tool for ReadFileTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("read_file")
            .description("Read the contents of a text file. Path is relative to the workspace root.")
            .param(ParamSpec::required("path", "str"))
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let root = self.root.clone();
        let requested = args.str("path")?.to_string();
        let path = tokio::task::spawn_blocking(move || resolve_path(&root, &requested)).await??;

        let metadata = tokio::fs::metadata(&path).await?;
        if metadata.is_dir() {
            return Err(ToolError::InvalidArgument(format!(
                "{} is a directory",
                path.display()
            )));
        }
        if metadata.len() > READ_FILE_MAX_SIZE {
            return Err(ToolError::Failed(format!(
                "File too large: {} bytes (max {})",
                metadata.len(),
                READ_FILE_MAX_SIZE
            )));
        }

        let content = tokio::fs::read(&path).await?;
        // Check for binary content (null bytes in the first few KB)
        let check_len = content.len().min(BINARY_DETECTION_BYTES);
        if content[..check_len].contains(&0) {
            return Err(ToolError::Failed(
                "Binary file detected. Cannot display binary content.".into(),
            ));
        }

        String::from_utf8(content)
            .map(ToolOutput::Text)
            .map_err(|_| ToolError::Failed("File is not valid UTF-8".into()))
    }
}
