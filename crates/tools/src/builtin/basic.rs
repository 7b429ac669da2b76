use serde_json::Value;
use skillgate_core::Result;
use skillgate_providers::{ToolParameter, ToolResult};

use crate::Tool;

/// Returns its `message` argument unchanged
#[derive(Debug)]
pub struct EchoTool;

impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo a message back verbatim."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![("message".to_string(), ToolParameter::new_string("Text to echo back"))])
    }

    fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult> {
        let message = arguments.get("message").and_then(|v| v.as_str()).unwrap_or("");
        Ok(ToolResult::success(tool_call_id, message))
    }
}

/// Does nothing and reports success
#[derive(Debug)]
pub struct NoopTool;

impl Tool for NoopTool {
    fn name(&self) -> &str {
        "noop"
    }

    fn description(&self) -> &str {
        "Do nothing and report success."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::empty_object()
    }

    fn execute(&self, tool_call_id: String, _arguments: &Value) -> Result<ToolResult> {
        Ok(ToolResult::success(tool_call_id, "ok"))
    }
}

/// Current time in RFC 3339, UTC by default
#[derive(Debug)]
pub struct CurrentTimeTool;

impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in RFC 3339 format."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![(
            "timezone".to_string(),
            ToolParameter::new_enum("Either 'utc' (default) or 'local'", vec!["utc".into(), "local".into()]),
        )])
    }

    fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult> {
        let now = match arguments.get("timezone").and_then(|v| v.as_str()).unwrap_or("utc") {
            "utc" => chrono::Utc::now().to_rfc3339(),
            "local" => chrono::Local::now().to_rfc3339(),
            other => {
                return Err(skillgate_core::Error::Validation(format!(
                    "current_time: unsupported timezone '{other}', use 'utc' or 'local'"
                )));
            }
        };
        Ok(ToolResult::success(tool_call_id, now))
    }
}
