//! Tool catalog, filtering and dispatch.

mod args;
pub mod builtin;
mod catalog;
mod error;
mod filter;
mod hooks;
mod registry;
mod runtime;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultToolRuntime, FunctionTool, Tool, ToolArgs, ToolCallResult, ToolCatalog, ToolError,
        ToolErrorKind, ToolExecutionContext, ToolFilter, ToolFuture, ToolRegistry, ToolRuntime,
        ToolRuntimeHooks,
    };
}

pub use args::{
    DecodedArguments, ToolArgs, decode_arguments, decode_or_empty, optional_bool,
    optional_number, parse_json_value, required_channel, required_number, required_string,
};
pub use catalog::ToolCatalog;
pub use error::{ToolError, ToolErrorKind};
pub use filter::{HIDDEN_TOOL_PREFIX, ToolFilter, is_hidden};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::ToolRegistry;
pub use runtime::{DefaultToolRuntime, ToolRuntime};
pub use tool::{FunctionTool, Tool, ToolFuture, object_definition};
pub use types::{ToolCallResult, ToolExecutionContext, render_output};
