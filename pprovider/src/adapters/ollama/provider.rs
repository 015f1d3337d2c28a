use std::sync::Arc;

use reqwest::Client;

use crate::adapters::completions::{
    Auth, CompletionsClient, CompletionsHttpTransport, CompletionsTransport,
};
use crate::{
    BoxedEventStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId,
};

use super::OLLAMA_BASE_URL;

/// Chat with a local model. The daemon needs no credentials.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: CompletionsClient,
}

impl OllamaProvider {
    pub fn new(transport: Arc<dyn CompletionsTransport>) -> Self {
        Self {
            client: CompletionsClient::new(ProviderId::Ollama, transport, "llama3.2"),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.client = self.client.with_fallback_model(model);
        self
    }

    pub fn default_http_transport(client: Client) -> CompletionsHttpTransport {
        CompletionsHttpTransport::new(client, OLLAMA_BASE_URL)
    }
}

impl ModelProvider for OllamaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(self.client.complete(request, Auth::Anonymous))
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(self.client.stream(request, Auth::Anonymous))
    }
}
