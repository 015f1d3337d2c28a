//! Model identifier naming convention for local and remote models.
//!
//! A leading `:` marks a remote model encoded as `:<vendor>:<model>`. Any other
//! identifier names a model served by the local runtime.
//!
//! ```rust
//! use pprovider::{ModelRoute, ProviderId};
//!
//! let remote = ModelRoute::parse(":openai:gpt-4o-mini").expect("valid id");
//! assert_eq!(remote.provider(), ProviderId::OpenAi);
//! assert_eq!(remote.model(), "gpt-4o-mini");
//!
//! let local = ModelRoute::parse("qwen3:4b").expect("valid id");
//! assert_eq!(local.provider(), ProviderId::Ollama);
//! assert_eq!(local.model(), "qwen3:4b");
//! ```

use std::fmt::{Display, Formatter};

use crate::{ProviderError, ProviderId};

pub const REMOTE_MODEL_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRoute {
    Local { model: String },
    Remote { vendor: ProviderId, model: String },
}

impl ModelRoute {
    pub fn parse(identifier: &str) -> Result<Self, ProviderError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ProviderError::invalid_request(
                "model identifier must not be empty",
            ));
        }

        let Some(rest) = identifier.strip_prefix(REMOTE_MODEL_SEPARATOR) else {
            return Ok(Self::Local {
                model: identifier.to_string(),
            });
        };

        let Some((vendor, model)) = rest.split_once(REMOTE_MODEL_SEPARATOR) else {
            return Err(ProviderError::invalid_request(format!(
                "remote model '{identifier}' must look like :<vendor>:<model>"
            )));
        };

        if model.trim().is_empty() {
            return Err(ProviderError::invalid_request(format!(
                "remote model '{identifier}' is missing a model name"
            )));
        }

        let vendor = parse_vendor(vendor)?;
        Ok(Self::Remote {
            vendor,
            model: model.trim().to_string(),
        })
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Local { .. } => ProviderId::Ollama,
            Self::Remote { vendor, .. } => *vendor,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Local { model } | Self::Remote { model, .. } => model,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl Display for ModelRoute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { model } => f.write_str(model),
            Self::Remote { vendor, model } => write!(
                f,
                "{REMOTE_MODEL_SEPARATOR}{vendor}{REMOTE_MODEL_SEPARATOR}{model}"
            ),
        }
    }
}

fn parse_vendor(vendor: &str) -> Result<ProviderId, ProviderError> {
    match vendor.trim().to_ascii_lowercase().as_str() {
        "openai" | "open-ai" => Ok(ProviderId::OpenAi),
        other => Err(ProviderError::invalid_request(format!(
            "unsupported remote vendor '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::ModelRoute;
    use crate::{ProviderErrorKind, ProviderId};

    #[test]
    fn local_ids_may_contain_the_separator_after_the_first_character() {
        let route = ModelRoute::parse("llama3.1:8b").expect("local id");
        assert!(!route.is_remote());
        assert_eq!(route.model(), "llama3.1:8b");
    }

    #[test]
    fn remote_model_names_keep_inner_separators() {
        let route = ModelRoute::parse(":openai:ft:gpt-4o-mini:acme").expect("remote id");
        assert_eq!(route.provider(), ProviderId::OpenAi);
        assert_eq!(route.model(), "ft:gpt-4o-mini:acme");
        assert_eq!(route.to_string(), ":openai:ft:gpt-4o-mini:acme");
    }

    #[test]
    fn malformed_remote_ids_are_rejected() {
        for identifier in [":openai", ":openai:", ""] {
            let error = ModelRoute::parse(identifier).expect_err("id should be rejected");
            assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
        }
    }

    #[test]
    fn unknown_vendors_are_rejected() {
        let error = ModelRoute::parse(":mistral:large").expect_err("vendor should fail");
        assert!(error.message.contains("mistral"));
    }
}
