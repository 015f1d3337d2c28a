//! Bounded tool-calling loop over a session, a backend and a tool catalog.
//!
//! ```rust
//! use pchat::{AgentState, DEFAULT_MAX_STEPS};
//!
//! assert_eq!(DEFAULT_MAX_STEPS, 10);
//! assert!(AgentState::Done.is_terminal());
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use pprovider::ToolDefinition;
use ptooling::{
    DefaultToolRuntime, NoopToolRuntimeHooks, ToolCatalog, ToolExecutionContext, ToolFilter,
    ToolRegistry, ToolRuntime, ToolRuntimeHooks,
};

use crate::{AgentHooks, Backend, ChatError, ConversationSession, NoopAgentHooks, TurnResponse};

pub const DEFAULT_MAX_STEPS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentState {
    AwaitingModel,
    ExecutingTools,
    Done,
}

impl AgentState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingModel => "awaiting_model",
            Self::ExecutingTools => "executing_tools",
            Self::Done => "done",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}

impl Display for AgentState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one agent turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    /// Last model response of the turn.
    pub response: TurnResponse,
    /// Tool output by tool name, across the whole turn. Later calls overwrite earlier ones.
    pub tool_results: BTreeMap<String, String>,
    pub states: Vec<AgentState>,
    pub model_calls: u32,
    pub step_budget_exhausted: bool,
}

pub struct AgentBuilder {
    backend: Backend,
    session: ConversationSession,
    catalog: ToolCatalog,
    filter: ToolFilter,
    max_steps: u32,
    tool_hooks: Arc<dyn ToolRuntimeHooks>,
    hooks: Arc<dyn AgentHooks>,
}

impl AgentBuilder {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            session: ConversationSession::default(),
            catalog: ToolCatalog::builtin(),
            filter: ToolFilter::AllowAll,
            max_steps: DEFAULT_MAX_STEPS,
            tool_hooks: Arc::new(NoopToolRuntimeHooks),
            hooks: Arc::new(NoopAgentHooks),
        }
    }

    pub fn session(mut self, session: ConversationSession) -> Self {
        self.session = session;
        self
    }

    pub fn catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn filter(mut self, filter: ToolFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn tool_hooks(mut self, tool_hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.tool_hooks = tool_hooks;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn AgentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Result<Agent, ChatError> {
        if self.max_steps == 0 {
            return Err(ChatError::invalid_request("max_steps must be at least 1"));
        }

        let registry = Arc::new(self.catalog.rebuild(&self.filter));
        let runtime = DefaultToolRuntime::new(registry).with_hooks(self.tool_hooks);

        Ok(Agent {
            session: self.session,
            backend: self.backend,
            catalog: self.catalog,
            filter: self.filter,
            runtime,
            max_steps: self.max_steps,
            hooks: self.hooks,
        })
    }
}

pub struct Agent {
    session: ConversationSession,
    backend: Backend,
    catalog: ToolCatalog,
    filter: ToolFilter,
    runtime: DefaultToolRuntime,
    max_steps: u32,
    hooks: Arc<dyn AgentHooks>,
}

impl Agent {
    pub fn builder(backend: Backend) -> AgentBuilder {
        AgentBuilder::new(backend)
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ConversationSession {
        &mut self.session
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        self.runtime.registry()
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.runtime.definitions()
    }

    pub fn set_filter(&mut self, filter: ToolFilter) -> usize {
        self.filter = filter;
        self.reload_tools()
    }

    /// Rebuilds the tool snapshot from the catalog and swaps it in. Returns the tool count.
    pub fn reload_tools(&mut self) -> usize {
        let registry = Arc::new(self.catalog.rebuild(&self.filter));
        let count = registry.len();
        self.runtime.replace_registry(registry);
        count
    }

    /// Runs one turn, calling tools until the model stops asking or the budget runs out.
    ///
    /// Blank queries return `Ok(None)` and leave history untouched. Backend failures
    /// propagate; whatever the turn already appended stays in the session.
    pub async fn chat(&mut self, query: Option<&str>) -> Result<Option<AgentReply>, ChatError> {
        let Some(query) = query.filter(|query| !query.trim().is_empty()) else {
            return Ok(None);
        };

        self.session.append_user(query);
        self.run_turn().await.map(Some)
    }

    async fn run_turn(&mut self) -> Result<AgentReply, ChatError> {
        let session_id = self.session.id().clone();
        let context = ToolExecutionContext::new(session_id.clone());
        let tools = self.runtime.definitions();
        let stream = self.backend.is_streaming();

        let mut state = AgentState::AwaitingModel;
        let mut states = vec![state];
        let mut tool_results = BTreeMap::new();
        let mut model_calls = 0;

        loop {
            model_calls += 1;
            self.hooks.on_model_call_start(&session_id, model_calls);
            let started_at = Instant::now();

            let response = match self
                .backend
                .run(self.session.messages(), &tools, stream)
                .await
            {
                Ok(response) => {
                    self.hooks.on_model_call_success(
                        &session_id,
                        model_calls,
                        &response,
                        started_at.elapsed(),
                    );
                    response
                }
                Err(error) => {
                    self.hooks.on_model_call_failure(
                        &session_id,
                        model_calls,
                        &error,
                        started_at.elapsed(),
                    );
                    return Err(error);
                }
            };

            if !response.content.is_empty() || response.has_tool_calls() {
                self.session
                    .append_assistant_with_calls(response.content.clone(), response.tool_calls.clone());
            }

            if !response.has_tool_calls() {
                self.transition(&mut state, &mut states, AgentState::Done);
                return Ok(AgentReply {
                    response,
                    tool_results,
                    states,
                    model_calls,
                    step_budget_exhausted: false,
                });
            }

            self.transition(&mut state, &mut states, AgentState::ExecutingTools);
            for call in response.tool_calls.iter().cloned() {
                let result = self.runtime.execute(call, &context).await;
                self.session.append_tool_result(&result);
                tool_results.insert(result.tool_name, result.content);
            }

            if model_calls >= self.max_steps {
                tracing::warn!(
                    session_id = %session_id,
                    max_steps = self.max_steps,
                    "step budget exhausted before the model produced a final answer"
                );
                self.hooks.on_step_budget_exhausted(&session_id, self.max_steps);
                return Ok(AgentReply {
                    response,
                    tool_results,
                    states,
                    model_calls,
                    step_budget_exhausted: true,
                });
            }

            self.transition(&mut state, &mut states, AgentState::AwaitingModel);
        }
    }

    fn transition(&self, state: &mut AgentState, states: &mut Vec<AgentState>, next: AgentState) {
        self.hooks
            .on_state_transition(self.session.id(), *state, next);
        *state = next;
        states.push(next);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pprovider::{
        BoxedEventStream, Message, ModelProvider, ModelRequest, ModelResponse, OutputItem,
        ProviderError, ProviderFuture, ProviderId, StopReason, TokenUsage, ToolCall,
        VecEventStream,
    };
    use ptooling::{ToolCatalog, ToolFilter, object_definition};
    use serde_json::json;

    use super::*;
    use crate::ChatErrorKind;

    /// Asks for `echo` until it sees a tool message, or forever when `loop_forever` is set.
    struct EchoProvider {
        loop_forever: bool,
        calls: Mutex<u32>,
    }

    impl EchoProvider {
        fn new(loop_forever: bool) -> Self {
            Self {
                loop_forever,
                calls: Mutex::new(0),
            }
        }

        fn respond(&self, request: &ModelRequest) -> ModelResponse {
            *self.calls.lock().expect("calls lock") += 1;
            let seen_tool = request
                .messages
                .iter()
                .any(|message| message.role == pprovider::Role::Tool);

            let output = if self.loop_forever || !seen_tool {
                vec![OutputItem::ToolCall(
                    ToolCall::new("echo", json!({"text": "hi"})).with_id("call_1"),
                )]
            } else {
                vec![OutputItem::Message(Message::assistant("echoed"))]
            };

            ModelResponse {
                provider: ProviderId::Ollama,
                model: request.model.clone(),
                output,
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            }
        }
    }

    impl ModelProvider for EchoProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Ollama
        }

        fn complete<'a>(
            &'a self,
            request: ModelRequest,
        ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
            Box::pin(async move { Ok(self.respond(&request)) })
        }

        fn stream<'a>(
            &'a self,
            request: ModelRequest,
        ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
            Box::pin(async move {
                let response = self.respond(&request);
                let stream = VecEventStream::new(Vec::new())
                    .push(pprovider::StreamEvent::ResponseComplete(response));
                Ok(Box::pin(stream) as BoxedEventStream<'a>)
            })
        }
    }

    fn echo_catalog() -> ToolCatalog {
        ToolCatalog::new().with_tool(ptooling::FunctionTool::new_sync(
            object_definition("echo", "Echo text", json!({"text": {"type": "string"}}), &["text"]),
            |args| Ok(args.get("text").cloned().unwrap_or_default()),
        ))
    }

    fn agent(provider: Arc<EchoProvider>, max_steps: u32) -> Agent {
        Agent::builder(Backend::local(provider, "qwen3:4b"))
            .catalog(echo_catalog())
            .max_steps(max_steps)
            .build()
            .expect("agent should build")
    }

    #[tokio::test]
    async fn blank_queries_do_not_touch_history() {
        let provider = Arc::new(EchoProvider::new(false));
        let mut agent = agent(provider.clone(), 3);

        assert_eq!(agent.chat(None).await.expect("none"), None);
        assert_eq!(agent.chat(Some("  ")).await.expect("blank"), None);
        assert_eq!(agent.session().len(), 1);
        assert_eq!(*provider.calls.lock().expect("calls lock"), 0);
    }

    #[tokio::test]
    async fn budget_bounds_model_calls_and_is_reported() {
        let provider = Arc::new(EchoProvider::new(true));
        let mut agent = agent(provider.clone(), 3);

        let reply = agent
            .chat(Some("echo forever"))
            .await
            .expect("turn should not fail")
            .expect("query is not blank");

        assert!(reply.step_budget_exhausted);
        assert_eq!(reply.model_calls, 3);
        assert_eq!(*provider.calls.lock().expect("calls lock"), 3);
        assert_eq!(reply.states.last(), Some(&AgentState::ExecutingTools));
        assert_eq!(reply.tool_results.get("echo").map(String::as_str), Some("hi"));
    }

    #[tokio::test]
    async fn single_step_budget_still_terminates() {
        let provider = Arc::new(EchoProvider::new(true));
        let mut agent = agent(provider.clone(), 1);

        let reply = agent
            .chat(Some("go"))
            .await
            .expect("turn should not fail")
            .expect("query is not blank");

        assert_eq!(reply.model_calls, 1);
        assert!(reply.step_budget_exhausted);
    }

    #[tokio::test]
    async fn streaming_backend_drives_the_same_loop() {
        let provider = Arc::new(EchoProvider::new(false));
        let mut agent = Agent::builder(Backend::local(provider, "qwen3:4b").with_streaming(true))
            .catalog(echo_catalog())
            .build()
            .expect("agent should build");

        let reply = agent
            .chat(Some("echo hi"))
            .await
            .expect("turn should succeed")
            .expect("query is not blank");

        assert_eq!(reply.response.content, "echoed");
        assert_eq!(reply.model_calls, 2);
    }

    #[test]
    fn zero_step_budget_is_rejected() {
        let error = Agent::builder(Backend::local(Arc::new(EchoProvider::new(false)), "m"))
            .max_steps(0)
            .build()
            .err()
            .expect("zero budget should fail");
        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
    }

    #[test]
    fn reload_applies_the_new_filter() {
        let mut agent = Agent::builder(Backend::local(Arc::new(EchoProvider::new(false)), "m"))
            .catalog(ToolCatalog::builtin())
            .build()
            .expect("agent should build");
        assert!(agent.registry().contains("set_rgb_color"));

        let entries = ["add_two_numbers".to_string()];
        let count = agent.set_filter(ToolFilter::from_entries(Some(entries.as_slice())));

        assert_eq!(count, 1);
        assert!(!agent.registry().contains("set_rgb_color"));
        assert_eq!(agent.tool_definitions()[0].name, "add_two_numbers");
    }
}
