use skillgate_providers::ToolCall;

/// Helper function to create a noop tool call for testing
pub fn noop_tool_call(id: &str) -> ToolCall {
    ToolCall::new(id, "noop", serde_json::json!({}))
}

/// Helper function to create an echo tool call for testing
pub fn echo_tool_call(id: &str, message: &str) -> ToolCall {
    ToolCall::new(id, "echo", serde_json::json!({"message": message}))
}

/// Helper function to create a statistics call over `data`
pub fn statistics_tool_call(id: &str, data: &[f64], metrics: &str) -> ToolCall {
    ToolCall::new(id, "calculate_statistics", serde_json::json!({"data": data, "metrics": metrics}))
}
