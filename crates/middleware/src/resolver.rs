//! Tool surface resolution.
//!
//! The surface is what the model may call on the next invocation: the base
//! tools, the tools of each active skill in activation order, then one
//! activation tool per listable inactive skill in catalog order. It depends only
//! on the catalog, the session state and the permission context, so identical
//! inputs always produce an identical surface.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use skillgate_providers::{ToolParameter, ToolSpec};
use skillgate_skills::{PermissionContext, SessionSkillState, Skill, SkillCatalog, may_activate, visible_for_listing};

/// Longest activation tool description, in characters
const SUMMARY_LIMIT: usize = 160;

/// Why a tool is on the surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "skill", rename_all = "lowercase")]
pub enum ToolOrigin {
    /// Always-visible base tool
    Base,
    /// Unlocked by the named active skill
    Skill(String),
    /// Pseudo-tool that activates the named skill
    Activation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceEntry {
    pub spec: ToolSpec,
    pub origin: ToolOrigin,
}

/// Ordered, duplicate-free list of tools visible to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolSurface {
    entries: Vec<SurfaceEntry>,
}

impl ToolSurface {
    pub fn entries(&self) -> &[SurfaceEntry] {
        &self.entries
    }

    /// Tool specs in surface order, the exact list handed to the model
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.entries.iter().map(|e| e.spec.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.spec.name()).collect()
    }

    /// Names of executable tools (base and skill tools, no activation tools)
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| !matches!(e.origin, ToolOrigin::Activation(_)))
            .map(|e| e.spec.name())
            .collect()
    }

    /// Skill ids offered for activation
    pub fn activatable(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match &e.origin {
                ToolOrigin::Activation(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.spec.name() == name)
    }

    pub fn origin_of(&self, name: &str) -> Option<&ToolOrigin> {
        self.entries.iter().find(|e| e.spec.name() == name).map(|e| &e.origin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Computes tool surfaces against a shared, immutable catalog.
#[derive(Debug, Clone)]
pub struct ToolSurfaceResolver {
    catalog: Arc<SkillCatalog>,
}

impl ToolSurfaceResolver {
    pub fn new(catalog: Arc<SkillCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<SkillCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn resolve(&self, state: &SessionSkillState, permissions: &PermissionContext) -> ToolSurface {
        let mut entries = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for spec in self.catalog.base_tools() {
            if seen.insert(spec.name().to_string()) {
                entries.push(SurfaceEntry { spec: spec.clone(), origin: ToolOrigin::Base });
            }
        }

        for id in state.active() {
            let Some(skill) = self.catalog.get(id) else {
                tracing::debug!(skill = %id, "active skill missing from catalog");
                continue;
            };
            if !may_activate(permissions, skill) {
                tracing::warn!(skill = %id, "active skill no longer permitted, tools withheld");
                continue;
            }
            for spec in &skill.tools {
                if seen.insert(spec.name().to_string()) {
                    entries.push(SurfaceEntry { spec: spec.clone(), origin: ToolOrigin::Skill(skill.id.clone()) });
                }
            }
        }

        for skill in self.catalog.list() {
            if state.is_active(&skill.id) || !visible_for_listing(permissions, skill) {
                continue;
            }
            let spec = activation_spec(skill);
            if seen.insert(spec.name().to_string()) {
                entries.push(SurfaceEntry { spec, origin: ToolOrigin::Activation(skill.id.clone()) });
            }
        }

        ToolSurface { entries }
    }
}

/// The pseudo-tool the model calls to activate `skill`.
pub fn activation_spec(skill: &Skill) -> ToolSpec {
    let parameters = ToolParameter::new_object(vec![(
        "reason".to_string(),
        ToolParameter::new_string("Optional note on why the skill is needed"),
    )]);
    ToolSpec::new(skill.activation_tool_name(), format!("Activate skill: {}", summarize(&skill.description)), parameters)
}

/// First line of `description`, cut to [`SUMMARY_LIMIT`] characters
fn summarize(description: &str) -> String {
    let first_line = description.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= SUMMARY_LIMIT {
        return first_line.to_string();
    }
    let cut: String = first_line.chars().take(SUMMARY_LIMIT - 3).collect();
    format!("{}...", cut.trim_end())
}
