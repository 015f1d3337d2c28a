//! Unified facade over the parley workspace crates.
//!
//! Most applications depend on this crate alone. It re-exports the session, backend,
//! tooling and observability crates and adds the pieces an application needs around
//! them: the config file, prompt presets, the model router and the assistant that ties
//! them together.
//!
//! ```rust
//! use parley::prelude::*;
//!
//! let session = ConversationSession::new("You are concise.");
//! assert_eq!(session.messages()[0].role, Role::System);
//! ```

pub mod assistant;
pub mod blocking;
pub mod config;
pub mod prelude;
pub mod presets;
pub mod router;

pub use pchat;
pub use pcommon;
pub use pobserve;
pub use pprovider;
pub use ptooling;

pub use pchat::{
    Agent, AgentBuilder, AgentHooks, AgentReply, AgentState, Backend, BackendKind, Chat,
    ChatError, ChatErrorKind, ConversationSession, DEFAULT_MAX_STEPS, DEFAULT_SYSTEM_PROMPT,
    NoopAgentHooks, NoopSink, OutputSink, TurnResponse, render_agent_reply, render_turn,
    render_value, strip_thinking,
};
pub use pcommon::{BoxFuture, GenerationOptions, MetadataMap, SessionId};
pub use pobserve::{
    MetricsObservabilityHooks, SafeAgentHooks, SafeToolHooks, TracingObservabilityHooks,
};
pub use pprovider::{
    FailureStage, Message, ModelCatalog, ModelDetails, ModelProvider, ModelRequest, ModelResponse,
    ModelRoute, OutputItem, ProviderError, ProviderErrorKind, ProviderFuture, ProviderId,
    ProviderRegistry, Role, SecureCredentialManager, StopReason, StreamEvent, TokenUsage, ToolCall,
    ToolDefinition,
};
pub use ptooling::{
    DefaultToolRuntime, FunctionTool, NoopToolRuntimeHooks, Tool, ToolArgs, ToolCallResult,
    ToolCatalog, ToolError, ToolErrorKind, ToolExecutionContext, ToolFilter, ToolFuture,
    ToolRegistry, ToolRuntime, ToolRuntimeHooks,
};

pub use assistant::{Assistant, AssistantBuilder, AssistantMode};
pub use blocking::BlockingAssistant;
pub use config::{AppSettings, ConfigError, ConfigErrorKind, ConfigStore, DEFAULT_CONFIG};
pub use presets::PromptPresets;
pub use router::{BackendResolver, BackendRouter, RouterConfig};
