//! One-shot model calls over a `ModelProvider`, streaming or not.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use pcommon::GenerationOptions;
use pprovider::{
    Message, ModelProvider, ModelRequest, ModelResponse, ProviderId, Role, StopReason,
    StreamEvent, StreamedToolCalls, TokenUsage, ToolCall, ToolDefinition,
};

use crate::ChatError;

/// Where the model runs. Chosen by the caller's router, never inferred here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

/// Receives streamed text as it arrives.
pub trait OutputSink: Send + Sync {
    fn on_stream_start(&self) {}

    fn on_chunk(&self, chunk: &str);

    fn on_stream_end(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl OutputSink for NoopSink {
    fn on_chunk(&self, _chunk: &str) {}
}

/// Model output for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResponse {
    pub model: String,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl TurnResponse {
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: content.into(),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant message to record in history, tool requests included.
    pub fn assistant_message(&self) -> Message {
        Message::assistant(self.content.clone()).with_tool_calls(self.tool_calls.clone())
    }
}

impl From<ModelResponse> for TurnResponse {
    fn from(response: ModelResponse) -> Self {
        Self {
            content: response.text(),
            tool_calls: response.tool_calls(),
            model: response.model,
            stop_reason: response.stop_reason,
            usage: response.usage,
        }
    }
}

#[derive(Clone)]
pub struct Backend {
    provider: Arc<dyn ModelProvider>,
    model: String,
    kind: BackendKind,
    options: GenerationOptions,
    sink: Arc<dyn OutputSink>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("provider", &self.provider.id())
            .field("model", &self.model)
            .field("kind", &self.kind)
            .field("options", &self.options)
            .finish()
    }
}

impl Backend {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            provider,
            model: model.into(),
            kind,
            options: GenerationOptions::default(),
            sink: Arc::new(NoopSink),
        }
    }

    pub fn local(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self::new(provider, model, BackendKind::Local)
    }

    pub fn remote(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self::new(provider, model, BackendKind::Remote)
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.options.stream = stream;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.id()
    }

    pub fn options(&self) -> GenerationOptions {
        self.options
    }

    pub fn is_streaming(&self) -> bool {
        self.options.stream
    }

    /// Sends `messages` to the model once.
    ///
    /// With `stream` set, text deltas are forwarded to the sink in arrival order and
    /// concatenated, so the returned content matches a non-streaming call.
    pub async fn run(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        stream: bool,
    ) -> Result<TurnResponse, ChatError> {
        let request = ModelRequest::builder(self.model.clone())
            .messages(messages.iter().cloned())
            .options(self.options.with_streaming(stream))
            .tools(tools.to_vec())
            .build()
            .map_err(|err| ChatError::invalid_request(err.message))?;

        tracing::debug!(
            provider = %self.provider.id(),
            model = %self.model,
            kind = ?self.kind,
            stream,
            messages = messages.len(),
            tools = tools.len(),
            "calling model backend"
        );
        let started_at = Instant::now();

        let response = if stream {
            self.run_streaming(request).await?
        } else {
            TurnResponse::from(self.provider.complete(request).await?)
        };

        tracing::debug!(
            model = %self.model,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            tool_calls = response.tool_calls.len(),
            "model backend responded"
        );
        Ok(response)
    }

    async fn run_streaming(&self, request: ModelRequest) -> Result<TurnResponse, ChatError> {
        let model = request.model.clone();
        let mut events = self.provider.stream(request).await?;
        self.sink.on_stream_start();

        let mut content = String::new();
        let mut streamed_calls = StreamedToolCalls::default();
        let mut terminal = None::<ModelResponse>;

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(error) => {
                    self.sink.on_stream_end();
                    return Err(error.into());
                }
            };

            match event {
                StreamEvent::TextDelta(delta) => {
                    self.sink.on_chunk(&delta);
                    content.push_str(&delta);
                }
                StreamEvent::ToolCallDelta { index, call } => streamed_calls.observe(index, call),
                StreamEvent::MessageComplete(message) => {
                    if message.role == Role::Assistant && content.is_empty() {
                        self.sink.on_chunk(&message.content);
                        content = message.content;
                    }
                }
                StreamEvent::ResponseComplete(response) => terminal = Some(response),
            }
        }
        self.sink.on_stream_end();

        let Some(response) = terminal else {
            let stop_reason = if streamed_calls.is_empty() {
                StopReason::Other
            } else {
                StopReason::ToolUse
            };
            return Ok(TurnResponse {
                model,
                content,
                tool_calls: streamed_calls.into_calls(),
                stop_reason,
                usage: TokenUsage::default(),
            });
        };

        let mut turn = TurnResponse::from(response);
        if !content.is_empty() {
            turn.content = content;
        }
        if turn.tool_calls.is_empty() {
            turn.tool_calls = streamed_calls.into_calls();
        }
        Ok(turn)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pprovider::{
        BoxedEventStream, OutputItem, ProviderError, ProviderFuture, VecEventStream,
    };

    use super::*;
    use crate::ChatErrorKind;

    #[derive(Debug)]
    struct ScriptedProvider {
        requests: Mutex<Vec<ModelRequest>>,
        fail: bool,
    }

    impl ScriptedProvider {
        fn new(fail: bool) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn response(model: String) -> ModelResponse {
            ModelResponse {
                provider: ProviderId::Ollama,
                model,
                output: vec![OutputItem::Message(Message::assistant("Hello there, friend."))],
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            }
        }
    }

    impl ModelProvider for ScriptedProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Ollama
        }

        fn complete<'a>(
            &'a self,
            request: ModelRequest,
        ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
            Box::pin(async move {
                self.requests.lock().expect("requests lock").push(request.clone());
                if self.fail {
                    return Err(ProviderError::unavailable("connection refused"));
                }
                Ok(Self::response(request.model))
            })
        }

        fn stream<'a>(
            &'a self,
            request: ModelRequest,
        ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
            Box::pin(async move {
                self.requests.lock().expect("requests lock").push(request.clone());
                let stream = VecEventStream::from_text_chunks("Hello there, friend.", 4)
                    .push(StreamEvent::ResponseComplete(Self::response(request.model)));
                Ok(Box::pin(stream) as BoxedEventStream<'a>)
            })
        }
    }

    /// Streams cumulative tool-call snapshots and stops without a terminal response.
    struct TruncatedStreamProvider;

    impl ModelProvider for TruncatedStreamProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Ollama
        }

        fn complete<'a>(
            &'a self,
            _request: ModelRequest,
        ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
            Box::pin(async { Err(ProviderError::other("streaming only")) })
        }

        fn stream<'a>(
            &'a self,
            _request: ModelRequest,
        ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
            Box::pin(async {
                let stream = VecEventStream::new(Vec::new())
                    .push_tool_call(
                        0,
                        ToolCall::new("add_two_numbers", "{\"a\":2").with_id("c1"),
                    )
                    .push_tool_call(1, ToolCall::new("list_devices", "{}").with_id("c2"))
                    .push_tool_call(
                        0,
                        ToolCall::new("add_two_numbers", "{\"a\":2,\"b\":3}").with_id("c1"),
                    );
                Ok(Box::pin(stream) as BoxedEventStream<'a>)
            })
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        chunks: Mutex<Vec<String>>,
        ends: Mutex<u32>,
    }

    impl OutputSink for CollectingSink {
        fn on_chunk(&self, chunk: &str) {
            self.chunks.lock().expect("chunks lock").push(chunk.to_string());
        }

        fn on_stream_end(&self) {
            *self.ends.lock().expect("ends lock") += 1;
        }
    }

    #[tokio::test]
    async fn streaming_and_non_streaming_produce_the_same_text() {
        let provider = Arc::new(ScriptedProvider::new(false));
        let sink = Arc::new(CollectingSink::default());
        let backend = Backend::local(provider.clone(), "qwen3:4b").with_sink(sink.clone());
        let messages = vec![Message::system("Be helpful"), Message::user("hi")];

        let plain = backend.run(&messages, &[], false).await.expect("complete");
        let streamed = backend.run(&messages, &[], true).await.expect("stream");

        assert_eq!(plain.content, streamed.content);
        assert_eq!(
            sink.chunks.lock().expect("chunks lock").concat(),
            "Hello there, friend."
        );
        assert_eq!(*sink.ends.lock().expect("ends lock"), 1);

        let requests = provider.requests.lock().expect("requests lock");
        assert!(!requests[0].options.stream);
        assert!(requests[1].options.stream);
    }

    #[tokio::test]
    async fn unterminated_stream_keeps_the_latest_snapshot_of_each_call() {
        let backend = Backend::local(Arc::new(TruncatedStreamProvider), "qwen3:4b");

        let turn = backend
            .run(&[Message::user("add 2 and 3")], &[], true)
            .await
            .expect("stream");

        assert_eq!(turn.stop_reason, StopReason::ToolUse);
        assert_eq!(turn.tool_calls.len(), 2);
        assert_eq!(turn.tool_calls[0].id.as_deref(), Some("c1"));
        assert_eq!(turn.tool_calls[0].arguments.to_encoded(), "{\"a\":2,\"b\":3}");
        assert_eq!(turn.tool_calls[1].name, "list_devices");
    }

    #[tokio::test]
    async fn tool_definitions_are_forwarded() {
        let provider = Arc::new(ScriptedProvider::new(false));
        let backend = Backend::remote(provider.clone(), "gpt-4o-mini");
        let tools = vec![ptooling::object_definition(
            "list_devices",
            "List devices",
            serde_json::json!({}),
            &[],
        )];

        backend
            .run(&[Message::user("lights?")], &tools, false)
            .await
            .expect("complete");

        assert_eq!(provider.requests.lock().expect("requests lock")[0].tools, tools);
    }

    #[tokio::test]
    async fn provider_failures_surface_as_backend_errors() {
        let backend = Backend::local(Arc::new(ScriptedProvider::new(true)), "qwen3:4b");

        let error = backend
            .run(&[Message::user("hi")], &[], false)
            .await
            .expect_err("provider fails");

        assert_eq!(error.kind, ChatErrorKind::Backend);
    }

    #[tokio::test]
    async fn empty_model_is_rejected_before_calling_the_provider() {
        let provider = Arc::new(ScriptedProvider::new(false));
        let backend = Backend::local(provider.clone(), " ");

        let error = backend
            .run(&[Message::user("hi")], &[], false)
            .await
            .expect_err("model is empty");

        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
        assert!(provider.requests.lock().expect("requests lock").is_empty());
    }
}
