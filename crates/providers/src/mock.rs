use crate::Provider;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use skillgate_core::{Error, Result};

/// Scripted model turns for deterministic testing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MockResponse {
    Text {
        content: String,
    },
    ToolCall {
        name: String,
        #[serde(default = "empty_args")]
        args: serde_json::Value,
    },
    /// Several calls in one assistant message (multi-call turn)
    ToolCalls {
        calls: Vec<MockToolCall>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockToolCall {
    pub name: String,
    #[serde(default = "empty_args")]
    pub args: serde_json::Value,
}

fn empty_args() -> serde_json::Value {
    serde_json::json!({})
}

/// Mock script file layout
#[derive(Debug, Deserialize)]
struct MockScript {
    responses: Vec<MockResponse>,
}

/// Mock provider that replays scripted responses and records every request
pub struct MockProvider {
    responses: Vec<MockResponse>,
    current: AtomicUsize,
    call_seq: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self { responses, current: AtomicUsize::new(0), call_seq: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    /// Parse a TOML script with a `[[responses]]` array
    pub fn from_toml_str(script: &str) -> Result<Self> {
        let script: MockScript = toml::from_str(script).map_err(|e| Error::Parse(format!("mock script: {}", e)))?;
        Ok(Self::new(script.responses))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of scripted responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.responses.len().saturating_sub(self.current.load(Ordering::SeqCst))
    }

    fn next_call_id(&self) -> String {
        format!("call_{}", self.call_seq.fetch_add(1, Ordering::SeqCst))
    }

    fn get_next_response(&self) -> MockResponse {
        let index = self.current.fetch_add(1, Ordering::SeqCst);
        if index < self.responses.len() {
            self.responses[index].clone()
        } else {
            tracing::warn!(requested = index + 1, available = self.responses.len(), "mock responses exhausted");
            MockResponse::Text {
                content: format!(
                    "No more mock responses configured (requested: {}, available: {})",
                    index + 1,
                    self.responses.len()
                ),
            }
        }
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);

        match self.get_next_response() {
            MockResponse::Text { content } => Ok(ChatResponse::new(ChatMessage::assistant(content))),
            MockResponse::ToolCall { name, args } => {
                let calls = vec![ToolCall::new(self.next_call_id(), name, args)];
                Ok(ChatResponse::new(ChatMessage::with_tool_calls("", calls.clone())).with_tool_calls(calls))
            }
            MockResponse::ToolCalls { calls } => {
                let calls: Vec<ToolCall> =
                    calls.into_iter().map(|c| ToolCall::new(self.next_call_id(), c.name, c.args)).collect();
                Ok(ChatResponse::new(ChatMessage::with_tool_calls("", calls.clone())).with_tool_calls(calls))
            }
            MockResponse::Error { message } => Err(Error::Provider(message)),
        }
    }
}
