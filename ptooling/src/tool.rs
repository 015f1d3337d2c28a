//! Tool trait contract for catalog-managed capabilities.
//!
//! ```rust
//! use pprovider::ToolDefinition;
//! use ptooling::{FunctionTool, Tool};
//! use serde_json::Value;
//!
//! let tool = FunctionTool::new(
//!     ToolDefinition {
//!         name: "echo".to_string(),
//!         description: "Echoes its arguments".to_string(),
//!         input_schema: r#"{"type":"object"}"#.to_string(),
//!     },
//!     |args, _ctx| async move { Ok(Value::Object(args)) },
//! );
//!
//! assert_eq!(tool.definition().name, "echo");
//! ```

use std::future::Future;
use std::sync::Arc;

use pcommon::BoxFuture;
use pprovider::ToolDefinition;
use serde_json::Value;

use crate::{ToolArgs, ToolError, ToolExecutionContext};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn invoke<'a>(
        &'a self,
        args: ToolArgs,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>>;
}

type ToolHandler = dyn Fn(ToolArgs, ToolExecutionContext) -> ToolFuture<'static, Result<Value, ToolError>>
    + Send
    + Sync;

pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(ToolArgs, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> =
            Arc::new(move |args, context| Box::pin(handler(args, context)));

        Self {
            definition,
            handler,
        }
    }

    pub fn new_sync<F>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(ToolArgs) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self::new(definition, move |args, _context| {
            let output = handler(args);
            async move { output }
        })
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn invoke<'a>(
        &'a self,
        args: ToolArgs,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        (self.handler)(args, context.clone())
    }
}

/// Builds a definition whose schema is an object with the given properties.
///
/// ```rust
/// use ptooling::object_definition;
/// use serde_json::json;
///
/// let definition = object_definition(
///     "add_two_numbers",
///     "Add two numbers",
///     json!({"a": {"type": "number"}, "b": {"type": "number"}}),
///     &["a", "b"],
/// );
/// assert!(definition.input_schema.contains("\"required\":[\"a\",\"b\"]"));
/// ```
pub fn object_definition(
    name: &str,
    description: &str,
    properties: Value,
    required: &[&str],
) -> ToolDefinition {
    let schema = serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    });

    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: schema.to_string(),
    }
}
