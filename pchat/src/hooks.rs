//! Lifecycle hooks for the agent loop.
//!
//! ```rust
//! use pchat::{AgentHooks, NoopAgentHooks};
//!
//! fn accepts_hooks(_hooks: &dyn AgentHooks) {}
//!
//! accepts_hooks(&NoopAgentHooks);
//! ```

use std::time::Duration;

use pcommon::SessionId;

use crate::{AgentState, ChatError, TurnResponse};

pub trait AgentHooks: Send + Sync {
    fn on_state_transition(&self, _session_id: &SessionId, _from: AgentState, _to: AgentState) {}

    fn on_model_call_start(&self, _session_id: &SessionId, _step: u32) {}

    fn on_model_call_success(
        &self,
        _session_id: &SessionId,
        _step: u32,
        _response: &TurnResponse,
        _elapsed: Duration,
    ) {
    }

    fn on_model_call_failure(
        &self,
        _session_id: &SessionId,
        _step: u32,
        _error: &ChatError,
        _elapsed: Duration,
    ) {
    }

    fn on_step_budget_exhausted(&self, _session_id: &SessionId, _max_steps: u32) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAgentHooks;

impl AgentHooks for NoopAgentHooks {}
