//! Common imports for most parley applications.

pub use crate::{
    AppSettings, Assistant, AssistantMode, BackendResolver, BackendRouter, BlockingAssistant,
    ConfigStore, RouterConfig,
};
pub use crate::{
    Agent, AgentReply, AgentState, Backend, BackendKind, Chat, ChatError, ChatErrorKind,
    ConversationSession, Message, ModelCatalog, ModelProvider, OutputSink, ProviderError,
    ProviderId, Role, SessionId, ToolCall, ToolCallResult, ToolCatalog, ToolDefinition,
    ToolError, ToolFilter, ToolRegistry, TurnResponse,
};
