use async_trait::async_trait;
use skillgate_core::Result;

use crate::types::{ChatRequest, ChatResponse};

/// Model boundary: a chat backend with native tool calling.
///
/// The middleware never calls this directly; the orchestrator passes the
/// resolved tool surface in `ChatRequest::tools` and reads tool calls back
/// from the response.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Run one model invocation
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}
