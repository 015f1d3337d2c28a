use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::{BoxedEventStream, ModelRequest, ModelResponse, ProviderError, ProviderId};

use super::sse::StreamAssembler;
use super::transport::{Auth, CompletionsTransport};
use super::wire::CompletionRequest;

/// Speaks `/chat/completions` on behalf of one provider.
#[derive(Debug, Clone)]
pub struct CompletionsClient {
    provider: ProviderId,
    transport: Arc<dyn CompletionsTransport>,
    fallback_model: String,
}

impl CompletionsClient {
    pub fn new(
        provider: ProviderId,
        transport: Arc<dyn CompletionsTransport>,
        fallback_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            transport,
            fallback_model: fallback_model.into(),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub async fn complete(
        &self,
        request: ModelRequest,
        auth: Auth,
    ) -> Result<ModelResponse, ProviderError> {
        let request = CompletionRequest::from_model_request(request, &self.fallback_model, false)?;
        let model = request.model.clone();
        let response = self.transport.complete(request, auth).await?;
        response.into_model_response(self.provider, &model)
    }

    pub async fn stream<'a>(
        &'a self,
        request: ModelRequest,
        auth: Auth,
    ) -> Result<BoxedEventStream<'a>, ProviderError> {
        let request = CompletionRequest::from_model_request(request, &self.fallback_model, true)?;
        let mut assembler = StreamAssembler::new(self.provider, request.model.clone());
        let mut chunks = self.transport.stream(request, auth).await?;

        let stream = try_stream! {
            while let Some(chunk) = chunks.next().await {
                for event in assembler.apply(chunk?) {
                    yield event;
                }
            }
            for event in assembler.finish() {
                yield event;
            }
        };

        Ok(Box::pin(stream) as BoxedEventStream<'a>)
    }
}
