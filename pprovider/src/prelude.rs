//! Common `pprovider` imports for downstream crates.

pub use crate::{
    BoxedEventStream, Message, ModelCatalog, ModelEventStream, ModelProvider, ModelRequest,
    ModelRequestBuilder, ModelResponse, ModelRoute, OutputItem, ProviderError, ProviderErrorKind,
    ProviderId, ProviderRegistry, Role, StopReason, StreamEvent, TokenUsage, ToolArguments,
    ToolCall, ToolDefinition,
};
pub use pcommon::{BoxFuture, MetadataMap};
