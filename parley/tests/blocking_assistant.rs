use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use parley::prelude::*;
use parley::{
    DEFAULT_CONFIG, ModelDetails, ModelRequest, ModelResponse, OutputItem, ProviderFuture,
    StopReason, StreamEvent, TokenUsage,
};
use pprovider::{BoxedEventStream, VecEventStream};
use serde_json::json;

struct ScriptedProvider {
    responses: Mutex<VecDeque<ModelResponse>>,
}

impl ModelProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn complete<'a>(
        &'a self,
        _request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .ok_or_else(|| ProviderError::other("script exhausted"))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let response = self.complete(request).await?;
            let stream = VecEventStream::from_text_chunks(&response.text(), 2)
                .push(StreamEvent::ResponseComplete(response));
            Ok(Box::pin(stream) as BoxedEventStream<'a>)
        })
    }
}

struct ScriptedResolver {
    script: Vec<ModelResponse>,
}

impl BackendResolver for ScriptedResolver {
    fn resolve(&self, model_id: &str) -> Result<Backend, ChatError> {
        let provider = Arc::new(ScriptedProvider {
            responses: Mutex::new(self.script.clone().into()),
        });
        Ok(Backend::local(provider, model_id))
    }
}

#[derive(Default)]
struct ToolModels {
    pulled: Mutex<Vec<String>>,
}

impl ModelCatalog for ToolModels {
    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move { Ok(vec!["qwen3:4b".to_string()]) })
    }

    fn show_model<'a>(
        &'a self,
        name: &'a str,
    ) -> ProviderFuture<'a, Result<ModelDetails, ProviderError>> {
        Box::pin(async move { Ok(ModelDetails::from_template(name, "<tool_call>")) })
    }

    fn pull_model<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            self.pulled.lock().expect("pulled lock").push(name.to_string());
            Ok(())
        })
    }
}

fn reply(output: Vec<OutputItem>) -> ModelResponse {
    ModelResponse {
        provider: ProviderId::Ollama,
        model: "qwen3:4b".to_string(),
        output,
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage::default(),
    }
}

#[derive(Default)]
struct CollectingSink {
    chunks: Mutex<Vec<String>>,
}

impl OutputSink for CollectingSink {
    fn on_chunk(&self, chunk: &str) {
        self.chunks.lock().expect("chunks lock").push(chunk.to_string());
    }
}

#[test]
fn default_config_drives_a_blocking_agent_turn() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store =
        ConfigStore::bootstrap(DEFAULT_CONFIG, dir.path().join("config.jsonc")).expect("config");
    let settings = AppSettings::from_config(&store).expect("settings");

    let resolver = Arc::new(ScriptedResolver {
        script: vec![
            reply(vec![OutputItem::ToolCall(
                ToolCall::new("add_two_numbers", json!({"a": 2, "b": 3})).with_id("call_1"),
            )]),
            reply(vec![OutputItem::Message(Message::assistant("The sum is 5."))]),
        ],
    });
    let assistant = Assistant::builder(resolver, Arc::new(ToolModels::default()))
        .settings(settings)
        .build();
    let mut blocking = BlockingAssistant::new(assistant).expect("runtime");

    assert_eq!(
        blocking.init_model("qwen3:4b").expect("init"),
        AssistantMode::Agent
    );
    blocking.set_system_prompt("Be brief.");
    let rendered = blocking.process("add 2 and 3").expect("turn");

    assert_eq!(rendered, "The sum is 5.\n\n{\"add_two_numbers\":\"5\"}");
    let session = blocking.session().expect("active session");
    assert_eq!(session.system_prompt(), "Be brief.");
    assert_eq!(session.len(), 5);
}

#[test]
fn blocking_streaming_forwards_chunks_to_the_sink() {
    let resolver = Arc::new(ScriptedResolver {
        script: vec![reply(vec![OutputItem::Message(Message::assistant(
            "streamed reply",
        ))])],
    });
    let sink = Arc::new(CollectingSink::default());
    let settings = AppSettings {
        stream: true,
        ..AppSettings::default()
    };
    let assistant = Assistant::builder(resolver, Arc::new(ToolModels::default()))
        .settings(settings)
        .sink(sink.clone())
        .build();
    let mut blocking = BlockingAssistant::new(assistant).expect("runtime");

    blocking.init_model("qwen3:4b").expect("init");
    let rendered = blocking.process("hi").expect("turn");

    assert_eq!(rendered, "streamed reply");
    assert_eq!(
        sink.chunks.lock().expect("chunks lock").concat(),
        "streamed reply"
    );
}

#[test]
fn ensure_models_pulls_only_missing_names() {
    let assistant = Assistant::builder(
        Arc::new(ScriptedResolver { script: Vec::new() }),
        Arc::new(ToolModels::default()),
    )
    .build();
    let blocking = BlockingAssistant::new(assistant).expect("runtime");
    let catalog = ToolModels::default();

    let pulled = blocking
        .ensure_models(&catalog, &["qwen3:4b".to_string(), "llama3.2".to_string()])
        .expect("pull");

    assert_eq!(pulled, vec!["llama3.2".to_string()]);
    assert_eq!(
        *catalog.pulled.lock().expect("pulled lock"),
        vec!["llama3.2".to_string()]
    );
}

#[test]
fn processing_before_init_reports_invalid_request() {
    let assistant = Assistant::builder(
        Arc::new(ScriptedResolver { script: Vec::new() }),
        Arc::new(ToolModels::default()),
    )
    .build();
    let mut blocking = BlockingAssistant::new(assistant).expect("runtime");

    let error = blocking.process("hello").expect_err("no model");
    assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
}
