use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pchat::prelude::*;
use pchat::render_agent_reply;
use pprovider::{
    BoxedEventStream, Message, ModelProvider, ModelRequest, ModelResponse, OutputItem,
    ProviderError, ProviderFuture, ProviderId, Role, StopReason, StreamEvent, TokenUsage,
    ToolCall, VecEventStream,
};
use serde_json::json;

/// Replays queued responses in order and records every request it receives.
struct QueueProvider {
    responses: Mutex<VecDeque<Result<ModelResponse, ProviderError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl QueueProvider {
    fn new(responses: Vec<Result<ModelResponse, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn next(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        self.requests.lock().expect("requests lock").push(request);
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::other("no scripted response left")))
    }

    fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

impl ModelProvider for QueueProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move { self.next(request) })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let response = self.next(request)?;
            let stream = VecEventStream::from_text_chunks(&response.text(), 3)
                .push(StreamEvent::ResponseComplete(response));
            Ok(Box::pin(stream) as BoxedEventStream<'a>)
        })
    }
}

fn text(content: &str) -> Result<ModelResponse, ProviderError> {
    Ok(ModelResponse {
        provider: ProviderId::Ollama,
        model: "qwen3:4b".to_string(),
        output: vec![OutputItem::Message(Message::assistant(content))],
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage::default(),
    })
}

fn calls(calls: Vec<ToolCall>) -> Result<ModelResponse, ProviderError> {
    Ok(ModelResponse {
        provider: ProviderId::Ollama,
        model: "qwen3:4b".to_string(),
        output: calls.into_iter().map(OutputItem::ToolCall).collect(),
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage::default(),
    })
}

fn agent(provider: Arc<QueueProvider>) -> Agent {
    Agent::builder(Backend::local(provider, "qwen3:4b"))
        .session(ConversationSession::new("Be helpful"))
        .catalog(ToolCatalog::builtin())
        .build()
        .expect("agent should build")
}

#[tokio::test]
async fn add_two_numbers_round_trip_reaches_done() {
    let provider = QueueProvider::new(vec![
        calls(vec![
            ToolCall::new("add_two_numbers", json!({"a": 2, "b": 3})).with_id("call_1"),
        ]),
        text("The sum is 5."),
    ]);
    let mut agent = agent(provider.clone());

    let reply = agent
        .chat(Some("add 2 and 3"))
        .await
        .expect("turn should succeed")
        .expect("query is not blank");

    assert_eq!(
        reply.states,
        vec![
            AgentState::AwaitingModel,
            AgentState::ExecutingTools,
            AgentState::AwaitingModel,
            AgentState::Done,
        ]
    );
    assert_eq!(reply.model_calls, 2);
    assert!(!reply.step_budget_exhausted);

    let tool_message = agent
        .session()
        .messages()
        .iter()
        .find(|message| message.role == Role::Tool)
        .expect("tool message should be recorded");
    assert_eq!(tool_message.content, "5");
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));

    let roles = agent
        .session()
        .messages()
        .iter()
        .map(|message| message.role)
        .collect::<Vec<_>>();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );

    let second_request = &provider.requests.lock().expect("requests lock")[1];
    assert_eq!(second_request.messages.len(), 4);
    assert!(second_request.tools.iter().any(|tool| tool.name == "add_two_numbers"));

    let rendered = render_agent_reply(&reply);
    assert!(rendered.contains('5'));
    assert!(rendered.starts_with("The sum is 5."));
}

#[tokio::test]
async fn backend_failure_keeps_only_the_user_message() {
    let provider = QueueProvider::new(vec![Err(ProviderError::unavailable("ollama is down"))]);
    let mut agent = agent(provider);
    let before = agent.session().len();

    let error = agent
        .chat(Some("hello"))
        .await
        .expect_err("backend failure should propagate");

    assert_eq!(error.kind, ChatErrorKind::Backend);
    assert_eq!(agent.session().len(), before + 1);
    assert_eq!(
        agent.session().last().map(|message| message.role),
        Some(Role::User)
    );
}

#[tokio::test]
async fn unknown_tools_and_bad_arguments_are_recovered() {
    let provider = QueueProvider::new(vec![
        calls(vec![
            ToolCall::new("fly_to_moon", "{}").with_id("call_1"),
            ToolCall::new("add_two_numbers", "{\"a\": 2,").with_id("call_2"),
        ]),
        text("I could not do that."),
    ]);
    let mut agent = agent(provider);

    let reply = agent
        .chat(Some("try things"))
        .await
        .expect("tool failures never abort the turn")
        .expect("query is not blank");

    assert_eq!(
        reply.tool_results.get("fly_to_moon").map(String::as_str),
        Some("[Function fly_to_moon not found]")
    );
    let decode = reply
        .tool_results
        .get("add_two_numbers")
        .expect("bad arguments still produce a result");
    assert!(decode.starts_with("[Warning] Could not decode arguments for tool 'add_two_numbers'"));
    assert!(decode.contains("[Error calling add_two_numbers]"));
    assert_eq!(reply.states.last(), Some(&AgentState::Done));
}

#[tokio::test]
async fn repeated_tool_names_keep_every_message_but_the_last_result() {
    let provider = QueueProvider::new(vec![
        calls(vec![
            ToolCall::new("add_two_numbers", json!({"a": 1, "b": 1})).with_id("call_1"),
            ToolCall::new("add_two_numbers", json!({"a": 2, "b": 2})).with_id("call_2"),
        ]),
        text("Done."),
    ]);
    let mut agent = agent(provider);

    let reply = agent
        .chat(Some("add twice"))
        .await
        .expect("turn should succeed")
        .expect("query is not blank");

    assert_eq!(reply.tool_results.len(), 1);
    assert_eq!(
        reply.tool_results.get("add_two_numbers").map(String::as_str),
        Some("4")
    );
    let tool_messages = agent
        .session()
        .messages()
        .iter()
        .filter(|message| message.role == Role::Tool)
        .count();
    assert_eq!(tool_messages, 2);
}

#[tokio::test]
async fn plain_chat_honours_the_blank_query_contract() {
    let provider = QueueProvider::new(vec![text("Hi!")]);
    let mut chat = Chat::new(
        ConversationSession::new("Be helpful"),
        Backend::local(provider.clone(), "qwen3:4b"),
    );

    assert_eq!(chat.chat(None).await.expect("none"), None);
    assert_eq!(chat.chat(Some("")).await.expect("empty"), None);
    assert_eq!(chat.session().len(), 1);
    assert_eq!(provider.request_count(), 0);

    let response = chat
        .chat(Some("hello"))
        .await
        .expect("turn should succeed")
        .expect("query is not blank");
    assert_eq!(response.content, "Hi!");
    assert_eq!(chat.session().len(), 3);
}

#[tokio::test]
async fn plain_chat_streams_the_same_text_it_would_return() {
    let streamed_provider = QueueProvider::new(vec![text("Streaming works fine.")]);
    let plain_provider = QueueProvider::new(vec![text("Streaming works fine.")]);

    let mut streamed = Chat::new(
        ConversationSession::default(),
        Backend::local(streamed_provider, "qwen3:4b").with_streaming(true),
    );
    let mut plain = Chat::new(
        ConversationSession::default(),
        Backend::local(plain_provider, "qwen3:4b"),
    );

    let streamed = streamed
        .chat(Some("hi"))
        .await
        .expect("stream")
        .expect("query is not blank");
    let plain = plain
        .chat(Some("hi"))
        .await
        .expect("complete")
        .expect("query is not blank");

    assert_eq!(streamed.content, plain.content);
}

#[tokio::test]
async fn plain_chat_failure_leaves_no_assistant_message() {
    let provider = QueueProvider::new(vec![Err(ProviderError::model_not_found("no model"))]);
    let mut chat = Chat::new(
        ConversationSession::default(),
        Backend::local(provider, "missing"),
    );

    let error = chat.chat(Some("hi")).await.expect_err("should fail");
    assert!(error.is_backend_failure());
    assert_eq!(chat.session().len(), 2);
    assert_eq!(
        chat.session().last().map(|message| message.role),
        Some(Role::User)
    );
}
