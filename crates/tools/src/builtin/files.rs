//! Executors for the `file_operations` skill.

use std::io::Read as StdIoRead;
use std::path::{Path, PathBuf};

use serde_json::Value;
use skillgate_core::{Error, Result};
use skillgate_providers::{ToolParameter, ToolResult};

use crate::Tool;
use crate::tool::required_str;

/// Default number of characters returned by `read_text_file`
const DEFAULT_MAX_CHARS: usize = 4000;

fn existing_file(tool: &str, arguments: &Value) -> Result<PathBuf> {
    let raw = required_str(tool, arguments, "file_path")?;
    if raw.is_empty() {
        return Err(Error::Validation(format!("{tool}: file_path cannot be empty")));
    }

    let path = PathBuf::from(raw);
    if !path.exists() {
        return Err(Error::Validation(format!("{tool}: file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(Error::Validation(format!("{tool}: path is a directory, not a file: {}", path.display())));
    }
    Ok(path)
}

/// Detects if a file is binary by checking the first block for null bytes
fn is_binary(path: &Path) -> Result<bool> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| Error::Tool(format!("Failed to open file '{}': {}", path.display(), e)))?;

    let mut buffer = [0u8; 8192];
    let bytes_read = StdIoRead::read(&mut file, &mut buffer)
        .map_err(|e| Error::Tool(format!("Failed to read file '{}': {}", path.display(), e)))?;

    Ok(buffer[..bytes_read].contains(&0u8))
}

/// File metadata as pretty JSON
#[derive(Debug)]
pub struct GetFileInfoTool;

impl Tool for GetFileInfoTool {
    fn name(&self) -> &str {
        "get_file_info"
    }

    fn description(&self) -> &str {
        "Get basic metadata for a file: name, size, extension and modification time."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![("file_path".to_string(), ToolParameter::new_string("Path to the file"))])
            .with_required(&["file_path"])
    }

    fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult> {
        let path = existing_file(self.name(), arguments)?;
        let metadata = std::fs::metadata(&path)?;

        let modified = metadata.modified().ok().map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339());
        let extension = path.extension().map(|e| format!(".{}", e.to_string_lossy().to_lowercase()));

        let info = serde_json::json!({
            "name": path.file_name().map(|n| n.to_string_lossy().to_string()),
            "path": path.display().to_string(),
            "size_bytes": metadata.len(),
            "extension": extension.unwrap_or_default(),
            "modified_time": modified,
        });

        Ok(ToolResult::success(tool_call_id, serde_json::to_string_pretty(&info)?))
    }
}

/// Text file contents, truncated to `max_chars`
#[derive(Debug)]
pub struct ReadTextFileTool;

impl Tool for ReadTextFileTool {
    fn name(&self) -> &str {
        "read_text_file"
    }

    fn description(&self) -> &str {
        "Read a UTF-8 text file, truncated to max_chars characters (default 4000). Binary files are rejected."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![
            ("file_path".to_string(), ToolParameter::new_string("Path to the file")),
            ("max_chars".to_string(), ToolParameter::new_integer("Maximum characters to return")),
        ])
        .with_required(&["file_path"])
    }

    fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult> {
        let path = existing_file(self.name(), arguments)?;
        let max_chars = arguments.get("max_chars").and_then(|v| v.as_u64()).map_or(DEFAULT_MAX_CHARS, |v| v as usize);

        if is_binary(&path)? {
            return Err(Error::Tool(format!("Cannot read binary file: {}", path.display())));
        }

        let bytes = std::fs::read(&path)?;
        let content = String::from_utf8_lossy(&bytes);
        let total = content.chars().count();

        if total == 0 {
            return Ok(ToolResult::success(tool_call_id, format!("File is empty: {}", path.display())));
        }

        let mut text: String = content.chars().take(max_chars).collect();
        if total > max_chars {
            text.push_str(&format!("\n[Truncated at {max_chars} of {total} characters]"));
        }

        Ok(ToolResult::success(tool_call_id, text))
    }
}
