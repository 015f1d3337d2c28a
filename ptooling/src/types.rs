//! Tool execution context and call result types.

use pcommon::{MetadataMap, SessionId};
use pprovider::{Message, ToolCall};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionContext {
    pub session_id: SessionId,
    pub metadata: MetadataMap,
}

impl ToolExecutionContext {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one dispatched tool call, successful or recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallResult {
    pub tool_name: String,
    pub call_id: Option<String>,
    pub content: String,
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn success(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_name: call.name.clone(),
            call_id: call.id.clone(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::success(call, content)
        }
    }

    pub fn not_found(call: &ToolCall) -> Self {
        Self::failure(call, format!("[Function {} not found]", call.name))
    }

    pub fn into_message(self) -> Message {
        Message::tool(self.tool_name, self.content, self.call_id)
    }
}

/// Renders a handler's output as tool message content.
///
/// Strings are used verbatim, every other value as compact JSON.
pub fn render_output(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
