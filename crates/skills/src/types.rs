//! Core types for the skills system.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use skillgate_providers::ToolSpec;

/// Prefix of the activation pseudo-tool exposed for every listable skill
pub const ACTIVATION_PREFIX: &str = "skill_";

/// Name of the pseudo-tool that activates `skill_id`.
pub fn activation_tool_name(skill_id: &str) -> String {
    format!("{ACTIVATION_PREFIX}{skill_id}")
}

/// Inverse of [`activation_tool_name`]; `None` unless the name carries the prefix
/// followed by a non-empty id.
pub fn skill_id_from_activation(tool_name: &str) -> Option<&str> {
    tool_name.strip_prefix(ACTIVATION_PREFIX).filter(|id| !id.is_empty())
}

/// Who may see and activate a skill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Any session
    #[default]
    Public,
    /// Only sessions whose permission context grants the skill id
    Restricted,
}

impl Visibility {
    /// Parse a bundle visibility tag. `internal` and `private` are treated as restricted.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "restricted" | "internal" | "private" => Some(Visibility::Restricted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A skill record owned by the catalog: instructions plus the tools it unlocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique identifier, lowercase with hyphens/underscores
    pub id: String,

    /// Short summary used for the activation pseudo-tool description
    pub description: String,

    /// Text injected into the conversation on activation
    pub instructions: String,

    /// Tools unlocked by this skill, in declaration order
    pub tools: Vec<ToolSpec>,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Bundle directory this skill was loaded from, if any
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl Skill {
    pub fn new(id: impl Into<String>, description: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
            visibility: Visibility::Public,
            version: "1.0.0".to_string(),
            author: String::new(),
            tags: Vec::new(),
            path: None,
        }
    }

    pub fn with_tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = ToolSpec>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_restricted(&self) -> bool {
        self.visibility == Visibility::Restricted
    }

    pub fn activation_tool_name(&self) -> String {
        activation_tool_name(&self.id)
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name())
    }

    /// Instructions used when a bundle ships none: the description, a tool
    /// listing and the tag areas the tools cover.
    pub fn default_instructions(&self) -> String {
        let tools = self
            .tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description().unwrap_or("")))
            .collect::<Vec<_>>()
            .join("\n");

        let mut text = format!("{}\n\nAvailable tools:\n{}", self.description, tools);
        if !self.tags.is_empty() {
            text.push_str(&format!("\n\nUse these tools to accomplish tasks related to: {}", self.tags.join(", ")));
        }
        text
    }
}

/// Startup-fatal catalog construction failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("skill id cannot be empty")]
    EmptySkillId,

    #[error("duplicate skill id: {0}")]
    DuplicateSkill(String),

    #[error("tool name '{tool}' is declared by both {first} and {second}")]
    ToolCollision { tool: String, first: String, second: String },

    #[error("tool name '{tool}' collides with the activation tool of skill '{skill}'")]
    ActivationNameCollision { tool: String, skill: String },
}

impl From<CatalogError> for skillgate_core::Error {
    fn from(err: CatalogError) -> Self {
        skillgate_core::Error::Catalog(err.to_string())
    }
}

/// Errors that can occur when working with skills.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Skill not found: {0}")]
    NotFound(String),

    #[error("Invalid SKILL.md frontmatter: {0}")]
    InvalidFrontmatter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid transition configuration: {0}")]
    InvalidTransition(String),
}

/// Result type for skill operations.
pub type Result<T> = std::result::Result<T, SkillError>;

impl From<SkillError> for skillgate_core::Error {
    fn from(err: SkillError) -> Self {
        match err {
            SkillError::Io(io) => skillgate_core::Error::Io(io),
            SkillError::InvalidTransition(msg) => skillgate_core::Error::Config(msg),
            other => skillgate_core::Error::Skill(other.to_string()),
        }
    }
}
