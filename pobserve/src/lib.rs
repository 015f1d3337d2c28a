//! Observability hooks for tool dispatch and the agent loop.
//!
//! ```rust
//! use pobserve::{MetricsObservabilityHooks, SafeAgentHooks, TracingObservabilityHooks};
//!
//! let _agent_hooks = SafeAgentHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeAgentHooks, SafeToolHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeAgentHooks, SafeToolHooks, TracingObservabilityHooks,
    };
}
