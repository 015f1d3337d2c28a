use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pchat::{AgentHooks, AgentState, ChatError, TurnResponse};
use pcommon::SessionId;
use pprovider::ToolCall;
use ptooling::{ToolCallResult, ToolError, ToolExecutionContext, ToolRuntimeHooks};

/// Runs the wrapped tool hooks, discarding any panic they raise.
pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_dispatch(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_dispatch(tool_call, context)
        }));
    }

    fn on_tool_result(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolCallResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_tool_result(tool_call, context, result, elapsed)
        }));
    }

    fn on_tool_recovered(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        result: &ToolCallResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_tool_recovered(tool_call, context, error, result, elapsed)
        }));
    }

    fn on_snapshot_replaced(&self, tool_names: &[String]) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_snapshot_replaced(tool_names)
        }));
    }
}

/// Runs the wrapped agent hooks, discarding any panic they raise.
pub struct SafeAgentHooks<H> {
    inner: H,
}

impl<H> SafeAgentHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> AgentHooks for SafeAgentHooks<H>
where
    H: AgentHooks,
{
    fn on_state_transition(&self, session_id: &SessionId, from: AgentState, to: AgentState) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_state_transition(session_id, from, to)
        }));
    }

    fn on_model_call_start(&self, session_id: &SessionId, step: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_model_call_start(session_id, step)
        }));
    }

    fn on_model_call_success(
        &self,
        session_id: &SessionId,
        step: u32,
        response: &TurnResponse,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_model_call_success(session_id, step, response, elapsed)
        }));
    }

    fn on_model_call_failure(
        &self,
        session_id: &SessionId,
        step: u32,
        error: &ChatError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_model_call_failure(session_id, step, error, elapsed)
        }));
    }

    fn on_step_budget_exhausted(&self, session_id: &SessionId, max_steps: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_step_budget_exhausted(session_id, max_steps)
        }));
    }
}
