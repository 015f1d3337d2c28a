//! Local model store contract: listing, capability inspection, validation, pulls.

use crate::{ProviderError, ProviderFuture};

/// Substrings whose presence in a model template marks tool-call support.
pub const TOOL_CALL_MARKERS: [&str; 2] = ["<tool_call>", "tool call"];

/// Name fragments of models that are not meant for conversation.
pub const NON_CHAT_MODEL_MARKERS: [&str; 2] = ["code", "embed"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelDetails {
    pub name: String,
    pub template: String,
    pub supports_tools: bool,
}

impl ModelDetails {
    pub fn from_template(name: impl Into<String>, template: impl Into<String>) -> Self {
        let template = template.into();
        Self {
            name: name.into(),
            supports_tools: template_supports_tools(&template),
            template,
        }
    }
}

pub fn template_supports_tools(template: &str) -> bool {
    TOOL_CALL_MARKERS
        .iter()
        .any(|marker| template.contains(marker))
}

pub fn is_chat_model(name: &str) -> bool {
    !NON_CHAT_MODEL_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
}

pub trait ModelCatalog: Send + Sync {
    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>>;

    fn show_model<'a>(
        &'a self,
        name: &'a str,
    ) -> ProviderFuture<'a, Result<ModelDetails, ProviderError>>;

    fn pull_model<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Result<(), ProviderError>>;

    fn supports_tools<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Result<bool, ProviderError>> {
        Box::pin(async move { Ok(self.show_model(name).await?.supports_tools) })
    }

    /// Fails with `ModelNotFound` listing what is available when `name` is absent.
    fn validate_model<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            let available = self.list_models().await?;
            if available.iter().any(|model| model == name) {
                return Ok(());
            }

            Err(ProviderError::model_not_found(format!(
                "model '{name}' is not available; available models: {}",
                available.join(", ")
            )))
        })
    }

    fn chat_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            Ok(self
                .list_models()
                .await?
                .into_iter()
                .filter(|name| is_chat_model(name))
                .collect())
        })
    }

    /// Pulls every name in `required` that is not already present.
    ///
    /// Returns the names that were pulled.
    fn ensure_models<'a>(
        &'a self,
        required: &'a [String],
    ) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            let available = self.list_models().await?;
            let mut pulled = Vec::new();
            for name in required {
                if available.iter().any(|model| model == name) {
                    continue;
                }

                tracing::info!(model = %name, "pulling missing model");
                self.pull_model(name).await?;
                pulled.push(name.clone());
            }
            Ok(pulled)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::{ModelCatalog, ModelDetails, is_chat_model, template_supports_tools};
    use crate::{ProviderError, ProviderErrorKind, ProviderFuture};

    struct FakeCatalog {
        models: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn new(models: &[&str]) -> Self {
            Self {
                models: Mutex::new(models.iter().map(|name| name.to_string()).collect()),
            }
        }
    }

    impl ModelCatalog for FakeCatalog {
        fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
            Box::pin(async move { Ok(self.models.lock().expect("models lock").clone()) })
        }

        fn show_model<'a>(
            &'a self,
            name: &'a str,
        ) -> ProviderFuture<'a, Result<ModelDetails, ProviderError>> {
            Box::pin(async move {
                let template = if name.starts_with("qwen") {
                    "{{- if .Tools }}<tool_call>{{ end }}"
                } else {
                    "{{ .Prompt }}"
                };
                Ok(ModelDetails::from_template(name, template))
            })
        }

        fn pull_model<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Result<(), ProviderError>> {
            Box::pin(async move {
                self.models.lock().expect("models lock").push(name.to_string());
                Ok(())
            })
        }
    }

    #[test]
    fn tool_markers_are_detected_in_templates() {
        assert!(template_supports_tools("... <tool_call> ..."));
        assert!(template_supports_tools("emit a tool call when needed"));
        assert!(!template_supports_tools("{{ .Prompt }}"));
    }

    #[test]
    fn coding_and_embedding_models_are_not_chat_models() {
        assert!(is_chat_model("llama3.2"));
        assert!(!is_chat_model("qwen2.5-coder:7b"));
        assert!(!is_chat_model("nomic-embed-text"));
    }

    #[tokio::test]
    async fn validate_model_lists_available_models_on_failure() {
        let catalog = FakeCatalog::new(&["llama3.2", "qwen3:4b"]);
        catalog
            .validate_model("qwen3:4b")
            .await
            .expect("present model should validate");

        let error = catalog
            .validate_model("mistral")
            .await
            .expect_err("missing model should fail");
        assert_eq!(error.kind, ProviderErrorKind::ModelNotFound);
        assert!(error.message.contains("llama3.2, qwen3:4b"));
    }

    #[tokio::test]
    async fn ensure_models_pulls_only_missing_names() {
        let catalog = FakeCatalog::new(&["llama3.2"]);
        let required = vec!["llama3.2".to_string(), "qwen3:4b".to_string()];

        let pulled = catalog
            .ensure_models(&required)
            .await
            .expect("ensure should succeed");

        assert_eq!(pulled, vec!["qwen3:4b".to_string()]);
        assert!(catalog.supports_tools("qwen3:4b").await.expect("show"));
        assert_eq!(
            catalog.chat_models().await.expect("list"),
            vec!["llama3.2".to_string(), "qwen3:4b".to_string()]
        );
    }
}
