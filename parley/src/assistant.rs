//! The assistant: one active model, plain chat or agent mode, rendered replies.

use std::sync::Arc;

use pchat::{
    Agent, AgentHooks, Chat, ChatError, ConversationSession, DEFAULT_SYSTEM_PROMPT, NoopSink,
    OutputSink, render_agent_reply, render_turn,
};
use pobserve::{SafeAgentHooks, SafeToolHooks, TracingObservabilityHooks};
use pprovider::{ModelCatalog, ModelRoute};
use ptooling::{ToolCatalog, ToolFilter, ToolRuntimeHooks};

use crate::config::AppSettings;
use crate::router::BackendResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantMode {
    Chat,
    Agent,
}

enum Conversation {
    Chat(Chat),
    Agent(Box<Agent>),
}

impl Conversation {
    fn mode(&self) -> AssistantMode {
        match self {
            Self::Chat(_) => AssistantMode::Chat,
            Self::Agent(_) => AssistantMode::Agent,
        }
    }

    fn session(&self) -> &ConversationSession {
        match self {
            Self::Chat(chat) => chat.session(),
            Self::Agent(agent) => agent.session(),
        }
    }

    fn session_mut(&mut self) -> &mut ConversationSession {
        match self {
            Self::Chat(chat) => chat.session_mut(),
            Self::Agent(agent) => agent.session_mut(),
        }
    }
}

struct ActiveModel {
    model_id: String,
    route: ModelRoute,
    conversation: Conversation,
}

pub struct AssistantBuilder {
    resolver: Arc<dyn BackendResolver>,
    catalog: Arc<dyn ModelCatalog>,
    settings: AppSettings,
    tools: ToolCatalog,
    system_prompt: String,
    sink: Arc<dyn OutputSink>,
    agent_hooks: Arc<dyn AgentHooks>,
    tool_hooks: Arc<dyn ToolRuntimeHooks>,
}

impl AssistantBuilder {
    pub fn new(resolver: Arc<dyn BackendResolver>, catalog: Arc<dyn ModelCatalog>) -> Self {
        Self {
            resolver,
            catalog,
            settings: AppSettings::default(),
            tools: ToolCatalog::builtin(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            sink: Arc::new(NoopSink),
            agent_hooks: Arc::new(SafeAgentHooks::new(TracingObservabilityHooks)),
            tool_hooks: Arc::new(SafeToolHooks::new(TracingObservabilityHooks)),
        }
    }

    pub fn settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn tools(mut self, tools: ToolCatalog) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Receives streamed text when `stream` is enabled in the settings.
    pub fn sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn agent_hooks(mut self, hooks: Arc<dyn AgentHooks>) -> Self {
        self.agent_hooks = hooks;
        self
    }

    pub fn tool_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.tool_hooks = hooks;
        self
    }

    pub fn build(self) -> Assistant {
        Assistant {
            resolver: self.resolver,
            catalog: self.catalog,
            settings: self.settings,
            tools: self.tools,
            system_prompt: self.system_prompt.trim().to_string(),
            sink: self.sink,
            agent_hooks: self.agent_hooks,
            tool_hooks: self.tool_hooks,
            active: None,
            last_response: String::new(),
        }
    }
}

pub struct Assistant {
    resolver: Arc<dyn BackendResolver>,
    catalog: Arc<dyn ModelCatalog>,
    settings: AppSettings,
    tools: ToolCatalog,
    system_prompt: String,
    sink: Arc<dyn OutputSink>,
    agent_hooks: Arc<dyn AgentHooks>,
    tool_hooks: Arc<dyn ToolRuntimeHooks>,
    active: Option<ActiveModel>,
    last_response: String,
}

impl Assistant {
    pub fn builder(
        resolver: Arc<dyn BackendResolver>,
        catalog: Arc<dyn ModelCatalog>,
    ) -> AssistantBuilder {
        AssistantBuilder::new(resolver, catalog)
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn model_id(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.model_id.as_str())
    }

    pub fn mode(&self) -> Option<AssistantMode> {
        self.active.as_ref().map(|active| active.conversation.mode())
    }

    pub fn session(&self) -> Option<&ConversationSession> {
        self.active
            .as_ref()
            .map(|active| active.conversation.session())
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn last_response(&self) -> &str {
        &self.last_response
    }

    /// Makes `model_id` the active model.
    ///
    /// Asking for the model that is already active keeps its conversation. Otherwise a
    /// fresh session starts, in agent mode when agents are enabled and the model can call
    /// tools, in plain chat mode otherwise.
    pub async fn init_model(&mut self, model_id: &str) -> Result<AssistantMode, ChatError> {
        let route = ModelRoute::parse(model_id)
            .map_err(|err| ChatError::backend_init(err.message).with_provider_kind(err.kind))?;

        if let Some(active) = &self.active
            && active.route == route
        {
            return Ok(active.conversation.mode());
        }

        let agent_mode = self.settings.agents_enabled && self.supports_tools(&route).await?;
        let backend = self
            .resolver
            .resolve(model_id)?
            .with_streaming(self.settings.stream)
            .with_sink(Arc::clone(&self.sink));
        let session = ConversationSession::new(self.system_prompt.clone());

        let conversation = if agent_mode {
            let filter = ToolFilter::from_entries(self.settings.agent_tools.as_deref());
            let agent = Agent::builder(backend)
                .session(session)
                .catalog(self.tools.clone())
                .filter(filter)
                .max_steps(self.settings.max_steps)
                .hooks(Arc::clone(&self.agent_hooks))
                .tool_hooks(Arc::clone(&self.tool_hooks))
                .build()?;
            Conversation::Agent(Box::new(agent))
        } else {
            Conversation::Chat(Chat::new(session, backend))
        };

        let mode = conversation.mode();
        tracing::info!(model = %route, mode = ?mode, "initialised model");
        self.active = Some(ActiveModel {
            model_id: model_id.trim().to_string(),
            route,
            conversation,
        });
        Ok(mode)
    }

    /// Replaces the system prompt of the active session and of every session started later.
    pub fn set_system_prompt(&mut self, prompt: &str) {
        self.system_prompt = prompt.trim().to_string();
        if let Some(active) = self.active.as_mut() {
            active
                .conversation
                .session_mut()
                .set_system_prompt(&self.system_prompt);
        }
    }

    /// Drops the active conversation history, keeping the system prompt.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.conversation.session_mut().reset();
        }
        self.last_response.clear();
    }

    /// Runs one turn against the active model and returns the rendered reply.
    ///
    /// A blank query renders as an empty string and leaves history untouched.
    pub async fn process(&mut self, query: &str) -> Result<String, ChatError> {
        let Some(active) = self.active.as_mut() else {
            return Err(ChatError::invalid_request(
                "no model initialised; call init_model first",
            ));
        };

        let rendered = match &mut active.conversation {
            Conversation::Chat(chat) => chat
                .chat(Some(query))
                .await?
                .map(|response| render_turn(&response)),
            Conversation::Agent(agent) => agent
                .chat(Some(query))
                .await?
                .map(|reply| render_agent_reply(&reply)),
        }
        .unwrap_or_default();

        self.last_response.clone_from(&rendered);
        Ok(rendered)
    }

    async fn supports_tools(&self, route: &ModelRoute) -> Result<bool, ChatError> {
        match route {
            ModelRoute::Local { model } => self
                .catalog
                .supports_tools(model)
                .await
                .map_err(|err| ChatError::backend_init(err.message).with_provider_kind(err.kind)),
            ModelRoute::Remote { .. } => Ok(self.resolver.remote_supports_tools(route)),
        }
    }
}
