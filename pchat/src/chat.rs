//! Plain multi-turn chat: a session bound to a backend, no tools.

use crate::{Backend, ChatError, ConversationSession, TurnResponse};

#[derive(Debug, Clone)]
pub struct Chat {
    session: ConversationSession,
    backend: Backend,
}

impl Chat {
    pub fn new(session: ConversationSession, backend: Backend) -> Self {
        Self { session, backend }
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

    pub fn into_session(self) -> ConversationSession {
        self.session
    }

    /// Runs one exchange.
    ///
    /// A missing or blank query returns `Ok(None)` without touching history. When the
    /// backend fails the user message stays recorded and the error is returned.
    pub async fn chat(&mut self, query: Option<&str>) -> Result<Option<TurnResponse>, ChatError> {
        let Some(query) = query.filter(|query| !query.trim().is_empty()) else {
            return Ok(None);
        };

        self.session.append_user(query);
        let response = self
            .backend
            .run(self.session.messages(), &[], self.backend.is_streaming())
            .await?;

        if !response.content.is_empty() {
            self.session.append_assistant(response.content.clone());
        }

        Ok(Some(response))
    }
}
