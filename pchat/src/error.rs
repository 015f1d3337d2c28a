//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::{FailureStage, ProviderError, ProviderErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    /// A backend could not be constructed: missing credentials, unknown vendor or model.
    BackendInit,
    /// The model call itself failed during a turn.
    Backend,
    Tooling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub provider_kind: Option<ProviderErrorKind>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider_kind: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn backend_init(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::BackendInit, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Backend, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn with_provider_kind(mut self, provider_kind: ProviderErrorKind) -> Self {
        self.provider_kind = Some(provider_kind);
        self
    }

    /// Whether the vendor failure points at configuration rather than this one call.
    pub fn provider_stage(&self) -> Option<FailureStage> {
        self.provider_kind.map(ProviderErrorKind::stage)
    }

    pub fn is_backend_failure(&self) -> bool {
        matches!(self.kind, ChatErrorKind::Backend | ChatErrorKind::BackendInit)
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::backend(value.to_string()).with_provider_kind(value.kind)
    }
}
