//! Tool runtime trait and the registry-backed dispatcher.

use std::sync::Arc;
use std::time::Instant;

use pprovider::{ToolCall, ToolDefinition};

use crate::args::decode_or_empty;
use crate::types::render_output;
use crate::{
    NoopToolRuntimeHooks, ToolCallResult, ToolError, ToolExecutionContext, ToolFuture,
    ToolRegistry, ToolRuntimeHooks,
};

/// Resolves and runs tool calls. Never fails: every problem becomes an error result.
pub trait ToolRuntime: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    fn execute<'a>(
        &'a self,
        tool_call: ToolCall,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, ToolCallResult>;
}

#[derive(Clone)]
pub struct DefaultToolRuntime {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl Default for DefaultToolRuntime {
    fn default() -> Self {
        Self::new(Arc::new(ToolRegistry::new()))
    }
}

impl DefaultToolRuntime {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    /// Swaps in a freshly rebuilt snapshot.
    pub fn replace_registry(&mut self, registry: Arc<ToolRegistry>) {
        self.hooks.on_snapshot_replaced(&registry.names());
        self.registry = registry;
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    fn execute<'a>(
        &'a self,
        tool_call: ToolCall,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, ToolCallResult> {
        Box::pin(async move {
            let started_at = Instant::now();
            self.hooks.on_dispatch(&tool_call, context);

            let Some(tool) = self.registry.get(&tool_call.name) else {
                let result = ToolCallResult::not_found(&tool_call);
                let error = ToolError::not_found(result.content.clone())
                    .with_tool_name(tool_call.name.clone());
                self.hooks.on_tool_recovered(
                    &tool_call,
                    context,
                    &error,
                    &result,
                    started_at.elapsed(),
                );
                return result;
            };

            let decoded = decode_or_empty(&tool_call.name, &tool_call.arguments);
            let outcome = tool.invoke(decoded.args, context).await;
            let elapsed = started_at.elapsed();

            let (content, error) = match outcome {
                Ok(value) => (render_output(&value), None),
                Err(error) => (
                    format!("[Error calling {}]: {}", tool_call.name, error.message),
                    Some(error),
                ),
            };

            match (decoded.diagnostic, error) {
                (None, None) => {
                    let result = ToolCallResult::success(&tool_call, content);
                    self.hooks
                        .on_tool_result(&tool_call, context, &result, elapsed);
                    result
                }
                (diagnostic, error) => {
                    let content = match &diagnostic {
                        Some(diagnostic) => format!("{diagnostic}\n{content}"),
                        None => content,
                    };
                    let error = error
                        .or_else(|| diagnostic.map(ToolError::invalid_arguments))
                        .unwrap_or_else(|| ToolError::other(content.clone()))
                        .with_tool_name(tool_call.name.clone());
                    let result = ToolCallResult::failure(&tool_call, content);
                    self.hooks
                        .on_tool_recovered(&tool_call, context, &error, &result, elapsed);
                    result
                }
            }
        })
    }
}
