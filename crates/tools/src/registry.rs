use std::collections::BTreeMap;
use std::sync::Arc;

use skillgate_core::Result;
use skillgate_providers::{ToolResult, ToolSpec};
use skillgate_skills::SkillCatalog;

use super::Tool;

/// Closed mapping from tool name to executor.
///
/// Populated during startup and then shared read-only; lookups never take a lock.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new tool in the registry
    ///
    /// Returns error if a tool with the same name already exists
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        let name = tool.name().to_string();

        if self.tools.contains_key(&name) {
            return Err(skillgate_core::Error::Validation(format!("Tool '{}' already registered", name)));
        }

        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    /// Gets a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Checks if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns names of all registered tools, sorted
    pub fn list(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Returns the number of registered tools
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Catalog tools (base and skill) that have no executor bound
    pub fn missing_executors(&self, catalog: &SkillCatalog) -> Vec<String> {
        catalog.all_tools().map(|spec| spec.name()).filter(|name| !self.has(name)).map(str::to_string).collect()
    }

    /// Executes a tool by name with given arguments
    pub fn execute(&self, tool_name: &str, tool_call_id: String, arguments: &serde_json::Value) -> Result<ToolResult> {
        match self.tools.get(tool_name) {
            Some(tool) => tool.execute(tool_call_id, arguments),
            None => Err(skillgate_core::Error::Tool(format!("Tool '{}' not found in registry", tool_name))),
        }
    }
}
