//! Conversation sessions, model backends and the tool-calling agent loop.
//!
//! ```rust
//! use pchat::{ConversationSession, DEFAULT_SYSTEM_PROMPT};
//!
//! let session = ConversationSession::default();
//! assert_eq!(session.system_prompt(), DEFAULT_SYSTEM_PROMPT);
//! ```

mod agent;
mod backend;
mod chat;
mod error;
mod hooks;
pub mod render;
mod session;

pub mod prelude {
    pub use crate::{
        Agent, AgentBuilder, AgentHooks, AgentReply, AgentState, Backend, BackendKind, Chat,
        ChatError, ChatErrorKind, ConversationSession, NoopAgentHooks, NoopSink, OutputSink,
        TurnResponse,
    };
    pub use pcommon::{GenerationOptions, SessionId};
    pub use ptooling::{ToolCallResult, ToolCatalog, ToolFilter, ToolRegistry};
}

pub use agent::{Agent, AgentBuilder, AgentReply, AgentState, DEFAULT_MAX_STEPS};
pub use backend::{Backend, BackendKind, NoopSink, OutputSink, TurnResponse};
pub use chat::Chat;
pub use error::{ChatError, ChatErrorKind};
pub use hooks::{AgentHooks, NoopAgentHooks};
pub use render::{render_agent_reply, render_turn, render_value, strip_thinking};
pub use session::{ConversationSession, DEFAULT_SYSTEM_PROMPT};
