//! Built-in tool executors
//!
//! `basic` holds the always-on base tools. The remaining modules back the
//! tools declared by the bundled demo skills under `skills/`.

mod basic;
mod files;
mod greeting;
mod statistics;

pub use basic::{CurrentTimeTool, EchoTool, NoopTool};
pub use files::{GetFileInfoTool, ReadTextFileTool};
pub use greeting::SayHelloTool;
pub use statistics::{CalculateStatisticsTool, SummarizeDataTool};

use crate::ToolRegistry;

/// Register the base tool set: executors that back always-visible tools
pub fn register_base_tools(registry: &mut ToolRegistry) -> skillgate_core::Result<()> {
    registry.register(EchoTool)?;
    registry.register(NoopTool)?;
    registry.register(CurrentTimeTool)?;
    Ok(())
}

/// Register executors for the tools the bundled skills declare
pub fn register_skill_tools(registry: &mut ToolRegistry) -> skillgate_core::Result<()> {
    registry.register(CalculateStatisticsTool)?;
    registry.register(SummarizeDataTool)?;
    registry.register(SayHelloTool)?;
    registry.register(GetFileInfoTool)?;
    registry.register(ReadTextFileTool)?;
    Ok(())
}

#[cfg(test)]
pub mod test_helpers;
