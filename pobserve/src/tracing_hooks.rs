//! Structured `tracing` events for tool dispatch and agent turns.
//!
//! ```rust
//! use pchat::AgentHooks;
//! use pobserve::TracingObservabilityHooks;
//!
//! fn accepts_agent_hooks(_hooks: &dyn AgentHooks) {}
//!
//! accepts_agent_hooks(&TracingObservabilityHooks);
//! ```

use std::time::Duration;

use pchat::{AgentHooks, AgentState, ChatError, TurnResponse};
use pcommon::SessionId;
use pprovider::ToolCall;
use ptooling::{ToolCallResult, ToolError, ToolExecutionContext, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_dispatch(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "dispatch",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id
        );
    }

    fn on_tool_result(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolCallResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "result",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id,
            output_bytes = result.content.len(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_tool_recovered(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        result: &ToolCallResult,
        elapsed: Duration,
    ) {
        tracing::warn!(
            phase = "tool",
            event = "recovered",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = %context.session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.is_retryable(),
            reply = %result.content,
            error = %error
        );
    }

    fn on_snapshot_replaced(&self, tool_names: &[String]) {
        tracing::info!(
            phase = "tool",
            event = "snapshot_replaced",
            tools = tool_names.len(),
            tool_names = ?tool_names
        );
    }
}

impl AgentHooks for TracingObservabilityHooks {
    fn on_state_transition(&self, session_id: &SessionId, from: AgentState, to: AgentState) {
        tracing::debug!(
            phase = "agent",
            event = "state_transition",
            session_id = %session_id,
            from = %from,
            to = %to
        );
    }

    fn on_model_call_start(&self, session_id: &SessionId, step: u32) {
        tracing::info!(
            phase = "agent",
            event = "model_call_start",
            session_id = %session_id,
            step
        );
    }

    fn on_model_call_success(
        &self,
        session_id: &SessionId,
        step: u32,
        response: &TurnResponse,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "agent",
            event = "model_call_success",
            session_id = %session_id,
            step,
            model = response.model,
            tool_calls = response.tool_calls.len(),
            stop_reason = ?response.stop_reason,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_model_call_failure(
        &self,
        session_id: &SessionId,
        step: u32,
        error: &ChatError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "agent",
            event = "model_call_failure",
            session_id = %session_id,
            step,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            provider_error_kind = ?error.provider_kind,
            provider_stage = ?error.provider_stage(),
            error = %error
        );
    }

    fn on_step_budget_exhausted(&self, session_id: &SessionId, max_steps: u32) {
        tracing::warn!(
            phase = "agent",
            event = "step_budget_exhausted",
            session_id = %session_id,
            max_steps
        );
    }
}
