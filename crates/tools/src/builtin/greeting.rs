use serde_json::Value;
use skillgate_core::Result;
use skillgate_providers::{ToolParameter, ToolResult};

use crate::Tool;

/// Executor for the `hello_world` demo skill
#[derive(Debug)]
pub struct SayHelloTool;

impl Tool for SayHelloTool {
    fn name(&self) -> &str {
        "say_hello"
    }

    fn description(&self) -> &str {
        "Say hello to someone."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![("name".to_string(), ToolParameter::new_string("Who to greet (default: world)"))])
    }

    fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult> {
        let name = arguments.get("name").and_then(|v| v.as_str()).filter(|n| !n.trim().is_empty()).unwrap_or("world");
        Ok(ToolResult::success(tool_call_id, format!("Hello, {name}!")))
    }
}
