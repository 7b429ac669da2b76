//! Parser for SKILL.md bundles with YAML frontmatter.
//!
//! Bundle layout:
//! ```markdown
//! ---
//! name: data_analysis
//! description: Statistical analysis of numeric data
//! version: 1.0.0
//! visibility: public
//! tags: [data, statistics]
//! tools:
//!   - name: calculate_statistics
//!     description: Mean, median and standard deviation of a series
//!     parameters:
//!       type: object
//!       properties:
//!         data:
//!           type: array
//!           items:
//!             type: number
//!       required: [data]
//! ---
//!
//! # Data Analysis
//! ...
//! ```
//!
//! The markdown body is the skill's instructions. An `instructions.md` file
//! next to `SKILL.md` takes precedence over the body; with neither, the
//! instructions are generated from the description and tool list.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use skillgate_providers::{ToolParameter, ToolSpec};

use crate::types::{Result, Skill, SkillError, Visibility};

/// Manifest file every bundle directory must contain
pub const SKILL_FILE: &str = "SKILL.md";

/// Optional instructions file overriding the SKILL.md body
pub const INSTRUCTIONS_FILE: &str = "instructions.md";

const MAX_DESCRIPTION_LEN: usize = 1024;

/// A parsed bundle, before catalog admission.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillBundle {
    pub skill: Skill,
    /// Disabled bundles parse successfully but are kept out of the catalog
    pub enabled: bool,
}

/// Parse the bundle rooted at `skill_dir`.
pub fn parse_bundle(skill_dir: &Path) -> Result<SkillBundle> {
    let skill_md = skill_dir.join(SKILL_FILE);

    if !skill_md.exists() {
        return Err(SkillError::NotFound(skill_md.display().to_string()));
    }

    let content = fs::read_to_string(&skill_md)?;
    let (frontmatter, body) = extract_frontmatter(&content)?;
    let enabled = frontmatter.enabled;

    let mut skill = build_skill(frontmatter)?;

    let instructions_path = skill_dir.join(INSTRUCTIONS_FILE);
    skill.instructions = if instructions_path.exists() {
        fs::read_to_string(&instructions_path)?.trim().to_string()
    } else {
        body
    };
    if skill.instructions.is_empty() {
        skill.instructions = skill.default_instructions();
    }
    skill.path = Some(skill_dir.to_path_buf());

    Ok(SkillBundle { skill, enabled })
}

/// Split SKILL.md content into parsed frontmatter and the trimmed body.
fn extract_frontmatter(content: &str) -> Result<(Frontmatter, String)> {
    let Some(rest) = content.strip_prefix("---") else {
        return Err(SkillError::InvalidFrontmatter("SKILL.md must start with ---".to_string()));
    };

    let frontmatter_end = rest
        .find("\n---")
        .ok_or_else(|| SkillError::InvalidFrontmatter("Closing --- not found".to_string()))?;

    let frontmatter_str = &rest[..frontmatter_end];
    let body = &rest[frontmatter_end + 4..];

    let frontmatter: Frontmatter = serde_yml::from_str(frontmatter_str)
        .map_err(|e| SkillError::InvalidFrontmatter(format!("YAML parse error: {e}")))?;

    Ok((frontmatter, body.trim().to_string()))
}

fn build_skill(frontmatter: Frontmatter) -> Result<Skill> {
    if frontmatter.name.is_empty() {
        return Err(SkillError::InvalidFrontmatter("name is required".to_string()));
    }

    if !is_valid_skill_name(&frontmatter.name) {
        return Err(SkillError::InvalidFrontmatter(
            "name must be lowercase with hyphens/underscores only".to_string(),
        ));
    }

    if frontmatter.description.is_empty() {
        return Err(SkillError::InvalidFrontmatter("description is required".to_string()));
    }

    if frontmatter.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(SkillError::InvalidFrontmatter(format!(
            "description must be <= {MAX_DESCRIPTION_LEN} characters"
        )));
    }

    let visibility = match frontmatter.visibility.as_deref() {
        None => Visibility::Public,
        Some(raw) => Visibility::parse_str(raw)
            .ok_or_else(|| SkillError::InvalidFrontmatter(format!("invalid visibility: {raw}")))?,
    };

    let tools = parse_tools(frontmatter.tools)?;

    Ok(Skill {
        id: frontmatter.name,
        description: frontmatter.description,
        instructions: String::new(),
        tools,
        visibility,
        version: frontmatter.version.unwrap_or_else(|| "1.0.0".to_string()),
        author: frontmatter.author.unwrap_or_default(),
        tags: frontmatter.tags.unwrap_or_default(),
        path: None,
    })
}

fn parse_tools(tools: Vec<FrontmatterTool>) -> Result<Vec<ToolSpec>> {
    if tools.is_empty() {
        return Err(SkillError::InvalidFrontmatter("at least one tool is required".to_string()));
    }

    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(tools.len());

    for tool in tools {
        if !is_valid_tool_name(&tool.name) {
            return Err(SkillError::InvalidFrontmatter(format!(
                "invalid tool name '{}': use letters, digits, '_' or '-'",
                tool.name
            )));
        }
        if !seen.insert(tool.name.clone()) {
            return Err(SkillError::InvalidFrontmatter(format!("tool '{}' declared twice", tool.name)));
        }

        let parameters = tool.parameters.unwrap_or_else(ToolParameter::empty_object);
        if !matches!(parameters, ToolParameter::Object { .. }) {
            return Err(SkillError::InvalidFrontmatter(format!(
                "parameters of tool '{}' must be an object schema",
                tool.name
            )));
        }

        specs.push(ToolSpec::new(tool.name, tool.description, parameters));
    }

    Ok(specs)
}

fn is_valid_skill_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// How serious a bundle issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// The bundle cannot be loaded
    Error,
    /// The bundle loads but something is probably unintended
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleIssue {
    pub severity: IssueSeverity,
    pub message: String,
}

impl BundleIssue {
    fn error(message: impl Into<String>) -> Self {
        Self { severity: IssueSeverity::Error, message: message.into() }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self { severity: IssueSeverity::Warning, message: message.into() }
    }
}

/// Check a bundle directory without admitting it anywhere.
///
/// An empty result means the bundle is clean.
pub fn validate_bundle(skill_dir: &Path) -> Vec<BundleIssue> {
    let mut issues = Vec::new();

    if !skill_dir.is_dir() {
        issues.push(BundleIssue::error(format!("{} is not a directory", skill_dir.display())));
        return issues;
    }

    let bundle = match parse_bundle(skill_dir) {
        Ok(bundle) => bundle,
        Err(e) => {
            issues.push(BundleIssue::error(e.to_string()));
            return issues;
        }
    };

    if let Some(dir_name) = skill_dir.file_name().and_then(|n| n.to_str())
        && dir_name != bundle.skill.id
    {
        issues.push(BundleIssue::warning(format!(
            "directory name '{dir_name}' differs from skill name '{}'",
            bundle.skill.id
        )));
    }

    if !skill_dir.join(INSTRUCTIONS_FILE).exists() && bundle.skill.instructions == bundle.skill.default_instructions()
    {
        issues.push(BundleIssue::warning("no instructions provided, using generated defaults"));
    }

    if !bundle.enabled {
        issues.push(BundleIssue::warning("bundle is disabled"));
    }

    for tool in &bundle.skill.tools {
        if tool.description().is_none_or(str::is_empty) {
            issues.push(BundleIssue::warning(format!("tool '{}' has no description", tool.name())));
        }
    }

    issues
}

/// YAML frontmatter structure.
#[derive(Debug, serde::Deserialize)]
struct Frontmatter {
    #[serde(default)]
    name: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    version: Option<String>,

    #[serde(default)]
    author: Option<String>,

    #[serde(default)]
    tags: Option<Vec<String>>,

    #[serde(default)]
    visibility: Option<String>,

    #[serde(default = "default_enabled")]
    enabled: bool,

    #[serde(default)]
    tools: Vec<FrontmatterTool>,
}

fn default_enabled() -> bool {
    true
}

/// Tool declaration inside the frontmatter
#[derive(Debug, serde::Deserialize)]
struct FrontmatterTool {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    parameters: Option<ToolParameter>,
}
