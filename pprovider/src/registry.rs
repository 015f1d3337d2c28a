//! Providers available to a router, one per vendor.
//!
//! ```rust
//! use pprovider::{ProviderId, ProviderRegistry};
//!
//! let registry = ProviderRegistry::new();
//! assert!(registry.get(ProviderId::Ollama).is_none());
//! ```

use std::sync::Arc;

use pcommon::Registry;

use crate::{ModelProvider, ProviderId};

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Registry<ProviderId, Arc<dyn ModelProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any provider previously registered under the same id.
    pub fn register(&mut self, provider: Arc<dyn ModelProvider>) -> Option<Arc<dyn ModelProvider>> {
        self.providers.insert(provider.id(), provider)
    }

    pub fn get(&self, provider_id: ProviderId) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(&provider_id).map(Arc::clone)
    }

    /// Registered ids in display order.
    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

impl FromIterator<Arc<dyn ModelProvider>> for ProviderRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ModelProvider>>>(iter: I) -> Self {
        let mut registry = Self::new();
        for provider in iter {
            registry.register(provider);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        BoxedEventStream, ModelProvider, ModelRequest, ModelResponse, ProviderError,
        ProviderFuture, ProviderId,
    };

    use super::ProviderRegistry;

    struct Named(ProviderId, &'static str);

    impl ModelProvider for Named {
        fn id(&self) -> ProviderId {
            self.0
        }

        fn complete<'a>(
            &'a self,
            _request: ModelRequest,
        ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
            Box::pin(async move { Err(ProviderError::other(self.1)) })
        }

        fn stream<'a>(
            &'a self,
            _request: ModelRequest,
        ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
            Box::pin(async move { Err(ProviderError::other(self.1)) })
        }
    }

    #[tokio::test]
    async fn later_registration_replaces_the_vendor_entry() {
        let registry: ProviderRegistry = [
            Arc::new(Named(ProviderId::Ollama, "first")) as Arc<dyn ModelProvider>,
            Arc::new(Named(ProviderId::OpenAi, "remote")),
            Arc::new(Named(ProviderId::Ollama, "second")),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec![ProviderId::Ollama, ProviderId::OpenAi]);

        let provider = registry.get(ProviderId::Ollama).expect("ollama registered");
        let error = provider
            .complete(ModelRequest::new("m", Vec::new()))
            .await
            .expect_err("named provider always fails");
        assert_eq!(error.message, "second");
    }
}
