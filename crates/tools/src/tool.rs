use serde_json::Value;
use skillgate_core::Result;
use skillgate_providers::{ToolParameter, ToolResult, ToolSpec};

/// The core trait that all tool executors must implement
pub trait Tool: Send + Sync + std::fmt::Debug {
    /// Returns the unique name of this tool
    fn name(&self) -> &str;

    /// Returns a description of what this tool does
    fn description(&self) -> &str;

    /// Returns the parameter schema for this tool
    fn parameters(&self) -> ToolParameter;

    /// Executes the tool with the given arguments
    ///
    /// Returns a [ToolResult] containing the tool call ID and output or error
    fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult>;

    /// Returns the full [ToolSpec] for this tool (for provider communication)
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name(), self.description(), self.parameters())
    }
}

/// Required string argument, or a validation error naming the tool and key
pub fn required_str<'a>(tool: &str, arguments: &'a Value, key: &str) -> Result<&'a str> {
    arguments.get(key).and_then(Value::as_str).ok_or_else(|| {
        skillgate_core::Error::Validation(format!("{tool}: missing required string argument '{key}'"))
    })
}

/// Required array of numbers
pub fn required_numbers(tool: &str, arguments: &Value, key: &str) -> Result<Vec<f64>> {
    let values = arguments
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| skillgate_core::Error::Validation(format!("{tool}: missing required array argument '{key}'")))?;

    values
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                skillgate_core::Error::Validation(format!("{tool}: '{key}' must contain only numbers, found {v}"))
            })
        })
        .collect()
}
