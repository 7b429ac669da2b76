//! Skill activation middleware.
//!
//! Sits between the turn loop and the tool executors. Before each model call
//! the [`ToolSurfaceResolver`] decides which tools the model may see; after
//! each model call the [`ActivationInterceptor`] turns `skill_<id>` calls into
//! session state transitions and lets every other call pass through.

mod interceptor;
mod prompt;
mod resolver;

pub use interceptor::{
    ActivationInterceptor, ActivationRejection, ActivationResult, CallKind, Interception, RejectionReason,
};
pub use prompt::system_prompt;
pub use resolver::{SurfaceEntry, ToolOrigin, ToolSurface, ToolSurfaceResolver, activation_spec};
