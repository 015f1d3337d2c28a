//! Callbacks around tool dispatch.
//!
//! Every dispatched call ends in exactly one of `on_tool_result` or `on_tool_recovered`,
//! because the runtime never lets a tool failure escape the turn.
//!
//! ```rust
//! use ptooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! accepts_tool_hooks(&NoopToolRuntimeHooks);
//! ```

use std::time::Duration;

use pprovider::ToolCall;

use crate::{ToolCallResult, ToolError, ToolExecutionContext};

pub trait ToolRuntimeHooks: Send + Sync {
    /// A call is about to be resolved against the current snapshot.
    fn on_dispatch(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {}

    fn on_tool_result(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolCallResult,
        _elapsed: Duration,
    ) {
    }

    /// The call failed and `result` carries the failure text back to the model.
    fn on_tool_recovered(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _result: &ToolCallResult,
        _elapsed: Duration,
    ) {
    }

    /// A rebuilt snapshot now answers dispatches.
    fn on_snapshot_replaced(&self, _tool_names: &[String]) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
