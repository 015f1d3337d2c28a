use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::{ProviderError, ProviderFuture, SecretString};

use super::sse::{SseEvent, SseFramer};
use super::wire::{CompletionChunk, CompletionRequest, CompletionResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Bearer(SecretString),
    Anonymous,
}

pub type CompletionChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<CompletionChunk, ProviderError>> + Send + 'a>>;

/// Moves completion bodies to and from a server.
///
/// Implementations decide nothing about conversations; they only carry bytes and
/// classify HTTP failures.
pub trait CompletionsTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
        auth: Auth,
    ) -> ProviderFuture<'a, Result<CompletionResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: CompletionRequest,
        auth: Auth,
    ) -> ProviderFuture<'a, Result<CompletionChunkStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct CompletionsHttpTransport {
    client: Client,
    base_url: String,
}

impl CompletionsHttpTransport {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, request: &CompletionRequest, auth: &Auth) -> Result<Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut builder = self.client.post(url).json(request);
        if let Auth::Bearer(key) = auth {
            builder = builder.bearer_auth(key.expose());
        }

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }
}

impl CompletionsTransport for CompletionsHttpTransport {
    fn complete<'a>(
        &'a self,
        mut request: CompletionRequest,
        auth: Auth,
    ) -> ProviderFuture<'a, Result<CompletionResponse, ProviderError>> {
        Box::pin(async move {
            request.stream = false;
            let response = self.post(&request, &auth).await?;
            response
                .json::<CompletionResponse>()
                .await
                .map_err(|err| ProviderError::transport(format!("malformed completion: {err}")))
        })
    }

    fn stream<'a>(
        &'a self,
        mut request: CompletionRequest,
        auth: Auth,
    ) -> ProviderFuture<'a, Result<CompletionChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let response = self.post(&request, &auth).await?;

            let stream = try_stream! {
                let mut bytes = response.bytes_stream();
                let mut framer = SseFramer::new();

                'read: while let Some(item) = bytes.next().await {
                    let item = item.map_err(map_send_error)?;
                    for event in framer.push(&item)? {
                        match event {
                            SseEvent::Done => break 'read,
                            SseEvent::Data(payload) => {
                                let chunk = serde_json::from_str::<CompletionChunk>(&payload)
                                    .map_err(|err| {
                                        ProviderError::transport(format!("malformed chunk: {err}"))
                                    })?;
                                yield chunk;
                            }
                        }
                    }
                }
            };

            Ok(Box::pin(stream) as CompletionChunkStream<'a>)
        })
    }
}

/// Classifies a non-success response.
///
/// Understands both `{"error": {"message": ".."}}` and `{"error": ".."}` bodies.
pub fn error_for_status(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("error") {
            Some(Value::String(message)) => Some(message.clone()),
            Some(error) => error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            None => None,
        })
        .unwrap_or_else(|| format!("request failed with status {status}"));

    let error = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::authentication(message),
        StatusCode::NOT_FOUND => ProviderError::model_not_found(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::timeout(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::invalid_request(message)
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            ProviderError::unavailable(message)
        }
        _ => ProviderError::transport(message),
    };
    error.with_status(status.as_u16())
}

pub(crate) fn map_send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else if err.is_connect() {
        ProviderError::unavailable(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}
