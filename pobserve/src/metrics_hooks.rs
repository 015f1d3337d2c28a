//! `metrics` counters and histograms for tool dispatch and agent turns.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use ptooling::ToolRuntimeHooks;
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! accepts_tool_hooks(&MetricsObservabilityHooks);
//! ```

use std::time::Duration;

use pchat::{AgentHooks, AgentState, ChatError, TurnResponse};
use pcommon::SessionId;
use pprovider::ToolCall;
use ptooling::{ToolCallResult, ToolError, ToolExecutionContext, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_dispatch(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "parley_tool_dispatch_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_tool_result(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolCallResult,
        elapsed: Duration,
    ) {
        metrics::histogram!(
            "parley_tool_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "outcome" => "result"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_tool_recovered(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        _result: &ToolCallResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_tool_recovered_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_tool_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "outcome" => "recovered"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_snapshot_replaced(&self, tool_names: &[String]) {
        metrics::gauge!("parley_tool_snapshot_size").set(tool_names.len() as f64);
    }
}

impl AgentHooks for MetricsObservabilityHooks {
    fn on_state_transition(&self, _session_id: &SessionId, _from: AgentState, to: AgentState) {
        metrics::counter!("parley_agent_state_entered_total", "state" => to.as_str())
            .increment(1);
    }

    fn on_model_call_start(&self, _session_id: &SessionId, _step: u32) {
        metrics::counter!("parley_agent_model_call_start_total").increment(1);
    }

    fn on_model_call_success(
        &self,
        _session_id: &SessionId,
        step: u32,
        response: &TurnResponse,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_agent_model_call_success_total",
            "model" => response.model.clone()
        )
        .increment(1);
        metrics::histogram!(
            "parley_agent_model_call_duration_seconds",
            "model" => response.model.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
        metrics::histogram!("parley_agent_step").record(step as f64);
    }

    fn on_model_call_failure(
        &self,
        _session_id: &SessionId,
        _step: u32,
        error: &ChatError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_agent_model_call_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_agent_model_call_duration_seconds",
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_step_budget_exhausted(&self, _session_id: &SessionId, _max_steps: u32) {
        metrics::counter!("parley_agent_step_budget_exhausted_total").increment(1);
    }
}
