//! Conversation history with a pinned system message.
//!
//! ```rust
//! use pchat::ConversationSession;
//! use pprovider::Role;
//!
//! let mut session = ConversationSession::new("Be helpful");
//! session.append_user("hi");
//! session.reset();
//!
//! assert_eq!(session.len(), 1);
//! assert_eq!(session.messages()[0].role, Role::System);
//! ```

use pcommon::SessionId;
use pprovider::{Message, ToolCall};
use ptooling::ToolCallResult;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Be helpful assistant.";

/// Ordered message history whose first entry is always the system message.
///
/// The vector is only reachable through append primitives, `reset` and
/// `set_system_prompt`, none of which can remove or move index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSession {
    id: SessionId,
    system_prompt: String,
    messages: Vec<Message>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

// Never empty: index 0 always holds the system message.
#[allow(clippy::len_without_is_empty)]
impl ConversationSession {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into().trim().to_string();
        Self {
            id: SessionId::generate(),
            messages: vec![Message::system(system_prompt.clone())],
            system_prompt,
        }
    }

    pub fn with_id(mut self, id: impl Into<SessionId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Replaces the system prompt and returns the prompt now in effect.
    ///
    /// Input equal to the current prompt after trimming leaves history untouched.
    pub fn set_system_prompt(&mut self, prompt: &str) -> &str {
        let prompt = prompt.trim();
        if prompt != self.system_prompt {
            self.system_prompt = prompt.to_string();
            self.messages[0] = Message::system(prompt);
        }
        &self.system_prompt
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether anything beyond the system message has been recorded.
    pub fn has_exchanges(&self) -> bool {
        self.messages.len() > 1
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Appends an assistant turn together with the tool calls it requested.
    pub fn append_assistant_with_calls(&mut self, text: impl Into<String>, calls: Vec<ToolCall>) {
        self.messages
            .push(Message::assistant(text).with_tool_calls(calls));
    }

    pub fn append_tool(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
        call_id: Option<String>,
    ) {
        self.messages.push(Message::tool(name, content, call_id));
    }

    pub fn append_tool_result(&mut self, result: &ToolCallResult) {
        self.append_tool(
            result.tool_name.clone(),
            result.content.clone(),
            result.call_id.clone(),
        );
    }

    /// Drops everything but the system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }
}
