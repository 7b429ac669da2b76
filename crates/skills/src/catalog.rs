//! Immutable, process-wide skill catalog.
//!
//! Built once from the base tool set and the loaded skills. Every ambiguity
//! (duplicate ids, tool names declared twice anywhere, real tools shadowing an
//! activation tool) is rejected here so call-time lookups never have to
//! disambiguate.

use std::collections::HashMap;
use std::fmt;

use skillgate_providers::ToolSpec;

use crate::types::{CatalogError, Result, Skill, SkillError, activation_tool_name};

/// Owner of a real (executable) tool name in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolOwner {
    /// Always-on base tool
    Base,
    /// Tool unlocked by the named skill
    Skill(String),
}

impl fmt::Display for ToolOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolOwner::Base => write!(f, "the base tool set"),
            ToolOwner::Skill(id) => write!(f, "skill '{}'", id),
        }
    }
}

#[derive(Debug, Default)]
pub struct SkillCatalog {
    base_tools: Vec<ToolSpec>,
    /// Catalog order: the order skills were supplied in
    skills: Vec<Skill>,
    index: HashMap<String, usize>,
    activation_index: HashMap<String, usize>,
    tool_owners: HashMap<String, ToolOwner>,
}

impl SkillCatalog {
    /// Build and validate a catalog.
    pub fn new(base_tools: Vec<ToolSpec>, skills: Vec<Skill>) -> std::result::Result<Self, CatalogError> {
        let mut tool_owners: HashMap<String, ToolOwner> = HashMap::new();

        for tool in &base_tools {
            claim_tool(&mut tool_owners, tool.name(), ToolOwner::Base)?;
        }

        let mut index = HashMap::with_capacity(skills.len());
        let mut activation_index = HashMap::with_capacity(skills.len());

        for (position, skill) in skills.iter().enumerate() {
            if skill.id.trim().is_empty() {
                return Err(CatalogError::EmptySkillId);
            }
            if index.insert(skill.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateSkill(skill.id.clone()));
            }
            activation_index.insert(activation_tool_name(&skill.id), position);

            for tool in &skill.tools {
                claim_tool(&mut tool_owners, tool.name(), ToolOwner::Skill(skill.id.clone()))?;
            }
        }

        for (tool, owner) in &tool_owners {
            if let Some(&position) = activation_index.get(tool) {
                tracing::error!(tool = %tool, owner = %owner, "tool name shadows an activation tool");
                return Err(CatalogError::ActivationNameCollision {
                    tool: tool.clone(),
                    skill: skills[position].id.clone(),
                });
            }
        }

        tracing::info!(
            skills = skills.len(),
            base_tools = base_tools.len(),
            tools = tool_owners.len(),
            "skill catalog built"
        );

        Ok(Self { base_tools, skills, index, activation_index, tool_owners })
    }

    /// Catalog with no skills and no base tools
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a skill by id.
    pub fn lookup(&self, id: &str) -> Result<&Skill> {
        self.get(id).ok_or_else(|| SkillError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Skill> {
        self.index.get(id).map(|&i| &self.skills[i])
    }

    /// All skills in catalog order
    pub fn list(&self) -> &[Skill] {
        &self.skills
    }

    pub fn base_tools(&self) -> &[ToolSpec] {
        &self.base_tools
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Owner of a real tool name, if the catalog knows it
    pub fn owner_of(&self, tool_name: &str) -> Option<&ToolOwner> {
        self.tool_owners.get(tool_name)
    }

    /// True for base and skill tools (never for activation pseudo-tools)
    pub fn is_real_tool(&self, tool_name: &str) -> bool {
        self.tool_owners.contains_key(tool_name)
    }

    /// The skill whose activation pseudo-tool is named `tool_name`
    pub fn skill_for_activation(&self, tool_name: &str) -> Option<&Skill> {
        self.activation_index.get(tool_name).map(|&i| &self.skills[i])
    }

    /// Every real tool spec: base tools first, then skills in catalog order
    pub fn all_tools(&self) -> impl Iterator<Item = &ToolSpec> {
        self.base_tools.iter().chain(self.skills.iter().flat_map(|s| s.tools.iter()))
    }

    /// Search by case-insensitive substring of id or description, and by tag.
    ///
    /// An empty query matches everything; when `tags` is non-empty a skill must
    /// carry at least one of them.
    pub fn search(&self, query: &str, tags: &[String]) -> Vec<&Skill> {
        let query = query.to_lowercase();
        self.skills
            .iter()
            .filter(|skill| {
                query.is_empty()
                    || skill.id.to_lowercase().contains(&query)
                    || skill.description.to_lowercase().contains(&query)
            })
            .filter(|skill| tags.is_empty() || tags.iter().any(|t| skill.tags.contains(t)))
            .collect()
    }
}

fn claim_tool(
    owners: &mut HashMap<String, ToolOwner>, name: &str, owner: ToolOwner,
) -> std::result::Result<(), CatalogError> {
    if let Some(existing) = owners.get(name) {
        return Err(CatalogError::ToolCollision {
            tool: name.to_string(),
            first: existing.to_string(),
            second: owner.to_string(),
        });
    }
    owners.insert(name.to_string(), owner);
    Ok(())
}
