//! Failures reported by a model vendor.
//!
//! Every kind belongs to a [`FailureStage`]. `Setup` failures mean the backend itself
//! is misconfigured (bad key, unknown model, malformed request) and repeating the turn
//! will not help. `Call` failures happen in flight and some of them are worth retrying.
//!
//! ```rust
//! use pprovider::{FailureStage, ProviderError};
//!
//! let auth = ProviderError::authentication("missing key");
//! assert_eq!(auth.stage(), FailureStage::Setup);
//! assert!(!auth.is_retryable());
//!
//! let busy = ProviderError::rate_limited("slow down").with_status(429);
//! assert_eq!(busy.stage(), FailureStage::Call);
//! assert!(busy.is_retryable());
//! assert_eq!(busy.to_string(), "RateLimited (HTTP 429): slow down");
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The backend cannot work as configured.
    Setup,
    /// The backend is fine but this exchange failed.
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Missing, malformed or rejected credentials.
    Authentication,
    /// The vendor does not serve the requested model.
    ModelNotFound,
    /// The request was refused before generation started.
    InvalidRequest,
    RateLimited,
    Timeout,
    /// Connection failures and undecodable replies.
    Transport,
    /// The vendor answered but is overloaded or down.
    Unavailable,
    Other,
}

impl ProviderErrorKind {
    pub fn stage(self) -> FailureStage {
        match self {
            Self::Authentication | Self::ModelNotFound | Self::InvalidRequest => {
                FailureStage::Setup
            }
            _ => FailureStage::Call,
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::Transport | Self::Unavailable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// HTTP status of the reply that carried the failure, when there was one.
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message)
    }

    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ModelNotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stage(&self) -> FailureStage {
        self.kind.stage()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{:?} (HTTP {status}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_problems_are_setup_failures() {
        for error in [
            ProviderError::authentication("no key"),
            ProviderError::model_not_found("no such model"),
            ProviderError::invalid_request("empty model"),
        ] {
            assert_eq!(error.stage(), FailureStage::Setup, "{error}");
            assert!(!error.is_retryable(), "{error}");
        }
    }

    #[test]
    fn in_flight_problems_are_call_failures() {
        for error in [
            ProviderError::timeout("slow"),
            ProviderError::transport("connection reset"),
            ProviderError::unavailable("overloaded"),
        ] {
            assert_eq!(error.stage(), FailureStage::Call, "{error}");
            assert!(error.is_retryable(), "{error}");
        }
        assert!(!ProviderError::other("odd").is_retryable());
    }
}
