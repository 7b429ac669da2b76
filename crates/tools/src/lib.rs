//! Tool executors behind the skill middleware.
//!
//! Only calls the activation interceptor passes through ever reach a
//! [ToolDispatcher]. The [ToolRegistry] is the closed name → executor map
//! checked against the skill catalog at startup.

pub mod builtin;
pub mod dispatcher;
pub mod registry;
pub mod tool;

pub use builtin::{
    CalculateStatisticsTool, CurrentTimeTool, EchoTool, GetFileInfoTool, NoopTool, ReadTextFileTool, SayHelloTool,
    SummarizeDataTool, register_base_tools, register_skill_tools,
};
pub use dispatcher::ToolDispatcher;
pub use registry::ToolRegistry;
pub use tool::{Tool, required_numbers, required_str};

/// Registry with the base tools and the bundled skills' executors
pub fn default_registry() -> skillgate_core::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_base_tools(&mut registry)?;
    register_skill_tools(&mut registry)?;
    Ok(registry)
}

/// Specs of the base tools, the always-visible part of every surface
pub fn base_tool_specs() -> Vec<skillgate_providers::ToolSpec> {
    vec![EchoTool.spec(), NoopTool.spec(), CurrentTimeTool.spec()]
}
