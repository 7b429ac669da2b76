//! Permission policy for skill listing and activation.
//!
//! Public skills are open to every session. Restricted skills need an explicit
//! grant (or a wildcard) in the session's [`PermissionContext`]. Listing and
//! activation share one rule, so a session is never offered an activation tool
//! it would then be refused.

use std::collections::BTreeSet;

use skillgate_core::PermissionsConfig;

use crate::types::{Skill, Visibility};

/// Immutable per-session set of granted skill ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionContext {
    granted: BTreeSet<String>,
    wildcard: bool,
}

impl PermissionContext {
    /// No grants: only public skills are reachable
    pub fn none() -> Self {
        Self::default()
    }

    /// Wildcard grant covering every restricted skill
    pub fn all() -> Self {
        Self { granted: BTreeSet::new(), wildcard: true }
    }

    pub fn granting(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { granted: ids.into_iter().map(Into::into).collect(), wildcard: false }
    }

    pub fn from_config(config: &PermissionsConfig) -> Self {
        Self { granted: config.grants.iter().cloned().collect(), wildcard: config.wildcard }
    }

    pub fn is_granted(&self, skill_id: &str) -> bool {
        self.wildcard || self.granted.contains(skill_id)
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn granted(&self) -> impl Iterator<Item = &str> {
        self.granted.iter().map(String::as_str)
    }
}

/// Whether a session holding `ctx` may activate `skill`.
pub fn may_activate(ctx: &PermissionContext, skill: &Skill) -> bool {
    match skill.visibility {
        Visibility::Public => true,
        Visibility::Restricted => ctx.is_granted(&skill.id),
    }
}

/// Whether `skill`'s activation tool may appear on the session's surface.
pub fn visible_for_listing(ctx: &PermissionContext, skill: &Skill) -> bool {
    may_activate(ctx, skill)
}
