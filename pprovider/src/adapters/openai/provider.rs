use std::sync::Arc;

use reqwest::Client;

use crate::adapters::completions::{
    Auth, CompletionsClient, CompletionsHttpTransport, CompletionsTransport,
};
use crate::{
    BoxedEventStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId, SecureCredentialManager,
};

use super::{OPENAI_API_KEY_ENV, OPENAI_BASE_URL};

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    credentials: Arc<SecureCredentialManager>,
    client: CompletionsClient,
}

impl OpenAiProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn CompletionsTransport>,
    ) -> Self {
        Self {
            credentials,
            client: CompletionsClient::new(ProviderId::OpenAi, transport, "gpt-4o-mini"),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.client = self.client.with_fallback_model(model);
        self
    }

    pub fn default_http_transport(client: Client) -> CompletionsHttpTransport {
        CompletionsHttpTransport::new(client, OPENAI_BASE_URL)
    }

    fn auth(&self) -> Result<Auth, ProviderError> {
        match self.credentials.api_key(ProviderId::OpenAi)? {
            Some(key) => Ok(Auth::Bearer(key)),
            None => Err(ProviderError::authentication(format!(
                "no OpenAI API key configured; set {OPENAI_API_KEY_ENV} or remote_models.openai.api_key"
            ))),
        }
    }
}

impl SecureCredentialManager {
    /// OpenAI keys are expected to start with `sk-`.
    pub fn set_openai_api_key(&self, api_key: impl Into<String>) -> Result<(), ProviderError> {
        let api_key = api_key.into();
        if !api_key.starts_with("sk-") {
            return Err(ProviderError::authentication(
                "OpenAI API key must start with 'sk-'",
            ));
        }

        self.set_api_key(ProviderId::OpenAi, api_key)
    }
}

impl ModelProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let auth = self.auth()?;
            self.client.complete(request, auth).await
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let auth = self.auth()?;
            self.client.stream(request, auth).await
        })
    }
}
