//! Activation interception.
//!
//! Every tool call the model makes is classified exactly once: either an
//! ordinary call bound for an executor, or an activation of a skill. Activations
//! are handled here and never reach an executor. Failed activations come back as
//! data for the model, never as errors for the orchestrator.

use serde_json::Value;
use skillgate_providers::{ToolCall, ToolResult};
use skillgate_skills::{PermissionContext, SessionSkillState, SkillCatalog, Transition, may_activate, skill_id_from_activation};

use crate::resolver::{ToolSurface, ToolSurfaceResolver};

/// Classification of an incoming tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind<'a> {
    Ordinary { name: &'a str, arguments: &'a Value },
    Activation { skill_id: &'a str },
}

/// Internal reason an activation was refused; never shown to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    SkillNotFound,
    PermissionDenied,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::SkillNotFound => "skill_not_found",
            RejectionReason::PermissionDenied => "permission_denied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRejection {
    pub skill_id: String,
    pub reason: RejectionReason,
}

impl ActivationRejection {
    /// Message surfaced to the model. Identical for every reason so a session
    /// cannot discover which restricted skills exist.
    pub fn message(&self) -> String {
        format!("Skill '{}' is not available in this session.", self.skill_id)
    }

    pub fn to_tool_result(&self, tool_call_id: impl Into<String>) -> ToolResult {
        ToolResult::error(tool_call_id, self.message())
    }
}

/// A successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationResult {
    pub skill_id: String,
    /// Instructions to append to the conversation as the call's output
    pub instructions: String,
    pub transition: Transition,
    /// Active skill ids after the transition
    pub active: Vec<String>,
    /// Surface recomputed after the transition
    pub surface: ToolSurface,
}

impl ActivationResult {
    pub fn to_tool_result(&self, tool_call_id: impl Into<String>) -> ToolResult {
        ToolResult::success(tool_call_id, self.instructions.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    Activated(ActivationResult),
    Rejected(ActivationRejection),
    /// Ordinary call; forward unchanged to the executor
    PassThrough,
}

impl Interception {
    /// Result to record for the call, or `None` for a pass-through
    pub fn to_tool_result(&self, tool_call_id: &str) -> Option<ToolResult> {
        match self {
            Interception::Activated(result) => Some(result.to_tool_result(tool_call_id)),
            Interception::Rejected(rejection) => Some(rejection.to_tool_result(tool_call_id)),
            Interception::PassThrough => None,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Interception::PassThrough)
    }
}

#[derive(Debug, Clone)]
pub struct ActivationInterceptor {
    resolver: ToolSurfaceResolver,
}

impl ActivationInterceptor {
    pub fn new(resolver: ToolSurfaceResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ToolSurfaceResolver {
        &self.resolver
    }

    fn catalog(&self) -> &SkillCatalog {
        self.resolver.catalog()
    }

    /// Real tool names win; otherwise the activation prefix marks an activation,
    /// including ones for ids the catalog does not know.
    pub fn classify<'a>(&self, call: &'a ToolCall) -> CallKind<'a> {
        let name = call.name();
        if !self.catalog().is_real_tool(name)
            && let Some(skill_id) = skill_id_from_activation(name)
        {
            return CallKind::Activation { skill_id };
        }
        CallKind::Ordinary { name, arguments: call.arguments() }
    }

    pub fn handle(&self, state: &mut SessionSkillState, permissions: &PermissionContext, call: &ToolCall) -> Interception {
        match self.classify(call) {
            CallKind::Ordinary { name, .. } => {
                tracing::debug!(tool = %name, call_id = %call.id, "passing tool call through");
                Interception::PassThrough
            }
            CallKind::Activation { skill_id } => self.activate(state, permissions, skill_id),
        }
    }

    /// Permission-check and apply one activation.
    pub fn activate(&self, state: &mut SessionSkillState, permissions: &PermissionContext, skill_id: &str) -> Interception {
        let skill = match self.catalog().lookup(skill_id) {
            Ok(skill) => skill,
            Err(_) => return reject(skill_id, RejectionReason::SkillNotFound),
        };

        if !may_activate(permissions, skill) {
            return reject(skill_id, RejectionReason::PermissionDenied);
        }

        let transition = state.activate(&skill.id);
        match &transition {
            Transition::Activated { dropped } => {
                tracing::info!(skill = %skill.id, mode = %state.mode(), dropped = ?dropped, "skill activated");
            }
            Transition::AlreadyActive => {
                tracing::debug!(skill = %skill.id, "skill already active");
            }
        }

        Interception::Activated(ActivationResult {
            skill_id: skill.id.clone(),
            instructions: skill.instructions.clone(),
            transition,
            active: state.active().to_vec(),
            surface: self.resolver.resolve(state, permissions),
        })
    }
}

fn reject(skill_id: &str, reason: RejectionReason) -> Interception {
    tracing::warn!(skill = %skill_id, reason = reason.as_str(), "skill activation rejected");
    Interception::Rejected(ActivationRejection { skill_id: skill_id.to_string(), reason })
}
