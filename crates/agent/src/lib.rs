//! Turn orchestration on top of the skill middleware.
//!
//! [`Agent`] drives model turns for sessions held in a [`SessionStore`]: one
//! activation state per conversation, one in-flight turn per session.

mod agent;
mod session_store;

pub use agent::{Agent, AgentEvent, StopReason, TurnOutcome};
pub use session_store::{SessionHandle, SessionStore, SkillSession};
