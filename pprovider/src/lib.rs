//! Provider-agnostic model access for parley.
//!
//! ```rust
//! use pprovider::{Message, ModelRequest, ModelRoute, Role};
//!
//! let route = ModelRoute::parse("llama3.2").expect("valid id");
//! let request = ModelRequest::new(route.model(), vec![Message::new(Role::User, "hi")]);
//! assert!(request.validate().is_ok());
//! ```

pub mod adapters;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod model;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod route;
pub mod stream;

pub use catalog::{ModelCatalog, ModelDetails, is_chat_model, template_supports_tools};
pub use credentials::{SecretString, SecureCredentialManager};
pub use error::{FailureStage, ProviderError, ProviderErrorKind};
pub use model::{
    Message, ModelRequest, ModelRequestBuilder, ModelResponse, OutputItem, ProviderId, Role,
    StopReason, TokenUsage, ToolArguments, ToolCall, ToolDefinition,
};
pub use pcommon::BoxFuture;
pub use provider::{ModelProvider, ProviderFuture};
pub use registry::ProviderRegistry;
pub use route::{ModelRoute, REMOTE_MODEL_SEPARATOR};
pub use stream::{
    BoxedEventStream, ModelEventStream, StreamEvent, StreamedToolCalls, VecEventStream,
};
