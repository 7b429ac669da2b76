use std::sync::Arc;

use skillgate_core::Result;
use skillgate_providers::{ToolCall, ToolResult};

use super::ToolRegistry;

/// Executes tool calls that have already cleared activation interception
///
/// The dispatcher is responsible for:
/// - Finding the executor in the registry
/// - Executing the tool
/// - Returning results in the format expected by the turn loop
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    /// Creates a new dispatcher with the given registry
    pub fn new(registry: impl Into<Arc<ToolRegistry>>) -> Self {
        Self { registry: registry.into() }
    }

    /// Executes a single tool call
    ///
    /// Takes a [ToolCall] from the provider and executes it,
    /// returning a [ToolResult] to be sent back to the turn loop
    pub fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        let tool_name = tool_call.name();
        let arguments = tool_call.arguments();
        let tool_call_id = tool_call.id.clone();

        tracing::debug!(tool = %tool_name, call_id = %tool_call_id, "dispatching tool call");
        self.registry.execute(tool_name, tool_call_id, arguments)
    }

    /// Executes a call and folds any executor error into a failed [ToolResult]
    ///
    /// The model sees the failure as ordinary tool output.
    pub fn execute_or_error(&self, tool_call: &ToolCall) -> ToolResult {
        match self.execute(tool_call) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %tool_call.name(), error = %e, "tool execution failed");
                ToolResult::error(tool_call.id.clone(), e.to_string())
            }
        }
    }
}
