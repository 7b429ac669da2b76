use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The role of a message sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: Role::Tool, content: content.into(), tool_call_id: Some(tool_call_id.into()), tool_calls: None }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None, tool_calls: Some(tool_calls) }
    }
}

/// A function call initiated by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A tool call made by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall { name: name.into(), arguments },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn arguments(&self) -> &serde_json::Value {
        &self.function.arguments
    }
}

/// Parameter schema, serialized as the JSON Schema subset tool-calling models accept.
///
/// Object properties are kept in a sorted map so two schemas built from the
/// same bundle always serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolParameter {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
        allowed: Option<Vec<String>>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Array {
        items: Box<ToolParameter>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Object {
        #[serde(default)]
        properties: BTreeMap<String, ToolParameter>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
    },
}

impl ToolParameter {
    pub fn new_string(description: impl Into<String>) -> Self {
        Self::String { description: Some(description.into()), allowed: None }
    }

    pub fn new_enum(description: impl Into<String>, allowed: Vec<String>) -> Self {
        Self::String { description: Some(description.into()), allowed: Some(allowed) }
    }

    pub fn new_number(description: impl Into<String>) -> Self {
        Self::Number { description: Some(description.into()) }
    }

    pub fn new_integer(description: impl Into<String>) -> Self {
        Self::Integer { description: Some(description.into()) }
    }

    pub fn new_boolean(description: impl Into<String>) -> Self {
        Self::Boolean { description: Some(description.into()) }
    }

    pub fn new_array(items: ToolParameter) -> Self {
        Self::Array { items: Box::new(items), description: None }
    }

    pub fn new_object(properties: Vec<(String, ToolParameter)>) -> Self {
        Self::Object { properties: properties.into_iter().collect(), description: None, required: Vec::new() }
    }

    /// An object schema with no properties (tools that take no arguments)
    pub fn empty_object() -> Self {
        Self::new_object(Vec::new())
    }

    /// Mark object properties as required; no-op for non-object schemas
    pub fn with_required(self, names: &[&str]) -> Self {
        match self {
            Self::Object { properties, description, .. } => {
                Self::Object { properties, description, required: names.iter().map(|n| n.to_string()).collect() }
            }
            other => other,
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        let description = Some(description.into());
        match self {
            Self::String { allowed, .. } => Self::String { description, allowed },
            Self::Number { .. } => Self::Number { description },
            Self::Integer { .. } => Self::Integer { description },
            Self::Boolean { .. } => Self::Boolean { description },
            Self::Array { items, .. } => Self::Array { items, description },
            Self::Object { properties, required, .. } => Self::Object { properties, description, required },
        }
    }
}

/// Specification of a tool available to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub spec_type: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: Option<String>,
    pub parameters: ToolParameter,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: ToolParameter) -> Self {
        Self {
            spec_type: "function".to_string(),
            function: FunctionSpec { name: name.into(), description: Some(description.into()), parameters },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn description(&self) -> Option<&str> {
        self.function.description.as_deref()
    }

    pub fn parameters(&self) -> &ToolParameter {
        &self.function.parameters
    }
}

/// Result from executing a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { tool_call_id: tool_call_id.into(), content: content.into(), error: None }
    }

    pub fn error(tool_call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self { tool_call_id: tool_call_id.into(), content: String::new(), error: Some(error.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Text the model sees for this result
    pub fn as_message_content(&self) -> String {
        match &self.error {
            Some(error) => format!("Error: {}", error),
            None => self.content.clone(),
        }
    }

    /// Convert into a `tool` role message for conversation history
    pub fn into_message(self) -> ChatMessage {
        let content = self.as_message_content();
        ChatMessage::tool(self.tool_call_id, content)
    }
}

/// A request to a chat provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,
}

impl ChatRequest {
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::default()
    }

    /// Names of the tools offered in this request, in order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().flatten().map(|t| t.name()).collect()
    }
}

#[derive(Default)]
pub struct ChatRequestBuilder {
    messages: Vec<ChatMessage>,
    tools: Option<Vec<ToolSpec>>,
}

impl ChatRequestBuilder {
    pub fn messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn build(self) -> ChatRequest {
        ChatRequest { messages: self.messages, tools: self.tools }
    }
}

/// A response from a chat provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatResponse {
    pub fn new(message: ChatMessage) -> Self {
        Self { message, tool_calls: None }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(tool_calls);
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().map(|calls| !calls.is_empty()).unwrap_or(false)
    }
}
