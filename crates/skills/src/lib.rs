//! Skill catalog, permission policy and per-session activation state.
//!
//! Skills are bundles of instructions plus tools that a session unlocks on
//! demand. Bundles are discovered from `SKILL.md` directories, validated into
//! an immutable [`SkillCatalog`] at startup, and activated per session through
//! a [`SessionSkillState`] governed by a [`TransitionMode`].

mod catalog;
mod loader;
mod parser;
mod permission;
mod state;
mod types;

pub use catalog::{SkillCatalog, ToolOwner};
pub use loader::{LoadFailure, LoadReport, SkillLoader};
pub use parser::{BundleIssue, IssueSeverity, SkillBundle, parse_bundle, validate_bundle};
pub use permission::{PermissionContext, may_activate, visible_for_listing};
pub use skillgate_core::TransitionMode;
pub use state::{SessionSkillState, Transition};
pub use types::{
    ACTIVATION_PREFIX, CatalogError, Result, Skill, SkillError, Visibility, activation_tool_name,
    skill_id_from_activation,
};
