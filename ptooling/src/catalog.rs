//! Statically declared tool table and snapshot rebuilding.
//!
//! ```rust
//! use ptooling::{ToolCatalog, ToolFilter};
//!
//! let catalog = ToolCatalog::builtin();
//! let registry = catalog.rebuild(&ToolFilter::AllowAll);
//! assert!(registry.contains("add_two_numbers"));
//! ```

use std::future::Future;
use std::sync::Arc;

use pprovider::ToolDefinition;
use serde_json::Value;

use crate::filter::is_hidden;
use crate::{
    FunctionTool, Tool, ToolArgs, ToolError, ToolExecutionContext, ToolFilter, ToolRegistry,
};

/// Ordered list of every tool known at startup.
///
/// Entries are never executed from here; `rebuild` turns them into a fresh
/// `ToolRegistry` snapshot after applying a filter.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    entries: Vec<Arc<dyn Tool>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with the built-in tools.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        crate::builtin::register_builtin(&mut catalog);
        catalog
    }

    pub fn with_tool<T>(mut self, tool: T) -> Self
    where
        T: Tool + 'static,
    {
        self.register(tool);
        self
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.entries.push(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.entries.push(tool);
    }

    pub fn register_fn<F, Fut>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(ToolArgs, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(definition, handler));
    }

    pub fn register_sync_fn<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(ToolArgs) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        self.register(FunctionTool::new_sync(definition, handler));
    }

    /// Builds a new snapshot of the visible, enabled tools.
    ///
    /// Hidden names are skipped regardless of `filter`, and a later entry replaces an
    /// earlier one with the same name.
    pub fn rebuild(&self, filter: &ToolFilter) -> ToolRegistry {
        let registry = ToolRegistry::from_tools(
            self.entries
                .iter()
                .filter(|tool| {
                    let name = tool.definition().name;
                    !is_hidden(&name) && filter.allows(&name)
                })
                .cloned(),
        );

        tracing::debug!(tools = ?registry.names(), "rebuilt tool registry");
        registry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
