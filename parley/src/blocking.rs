//! Synchronous front for callers without an async runtime.
//!
//! The same async code runs underneath on a private current-thread runtime; streamed
//! chunks still reach the configured sink in arrival order.

use pchat::{ChatError, ConversationSession};
use pprovider::ModelCatalog;
use tokio::runtime::{Builder, Runtime};

use crate::assistant::{Assistant, AssistantMode};

pub struct BlockingAssistant {
    runtime: Runtime,
    inner: Assistant,
}

impl BlockingAssistant {
    /// Must not be called from inside another tokio runtime.
    pub fn new(inner: Assistant) -> Result<Self, ChatError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| ChatError::backend_init(format!("blocking runtime: {err}")))?;

        Ok(Self { runtime, inner })
    }

    pub fn assistant(&self) -> &Assistant {
        &self.inner
    }

    pub fn assistant_mut(&mut self) -> &mut Assistant {
        &mut self.inner
    }

    pub fn into_inner(self) -> Assistant {
        self.inner
    }

    pub fn session(&self) -> Option<&ConversationSession> {
        self.inner.session()
    }

    pub fn init_model(&mut self, model_id: &str) -> Result<AssistantMode, ChatError> {
        self.runtime.block_on(self.inner.init_model(model_id))
    }

    pub fn set_system_prompt(&mut self, prompt: &str) {
        self.inner.set_system_prompt(prompt);
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn process(&mut self, query: &str) -> Result<String, ChatError> {
        self.runtime.block_on(self.inner.process(query))
    }

    /// Pulls every model in `required` the local store does not have yet.
    pub fn ensure_models(
        &self,
        catalog: &dyn ModelCatalog,
        required: &[String],
    ) -> Result<Vec<String>, ChatError> {
        Ok(self.runtime.block_on(catalog.ensure_models(required))?)
    }
}
