pub mod mock;
pub mod provider;
pub mod types;

pub use mock::{MockProvider, MockResponse, MockToolCall};
pub use provider::Provider;
pub use types::{
    ChatMessage, ChatRequest, ChatRequestBuilder, ChatResponse, FunctionCall, FunctionSpec, Role, ToolCall,
    ToolParameter, ToolResult, ToolSpec,
};

pub use skillgate_core::{Error, Result};
