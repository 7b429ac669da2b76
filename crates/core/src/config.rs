use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "SKILLGATE_";

/// Default FIFO capacity when none is configured
pub const DEFAULT_FIFO_CAPACITY: usize = 3;

/// How an activation mutates a session's active skill set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionMode {
    /// Only the most recently activated skill is live (default)
    #[default]
    Replace,
    /// Skills pile up in activation order, re-activation is a no-op
    Accumulate,
    /// Bounded insertion-order queue, oldest evicted first
    Fifo,
}

impl TransitionMode {
    pub const VALUES: &[TransitionMode] = &[TransitionMode::Replace, TransitionMode::Accumulate, TransitionMode::Fifo];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionMode::Replace => "replace",
            TransitionMode::Accumulate => "accumulate",
            TransitionMode::Fifo => "fifo",
        }
    }
}

impl std::fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransitionMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(TransitionMode::Replace),
            "accumulate" => Ok(TransitionMode::Accumulate),
            "fifo" => Ok(TransitionMode::Fifo),
            _ => Err(Error::Config(ConfigError::InvalidStateMode(s.to_string()).to_string())),
        }
    }
}

/// Where skill bundles are discovered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SkillsConfig {
    /// Bundle directories, searched in order; the first bundle with a given id wins
    pub dirs: Vec<PathBuf>,

    /// Discover bundles at startup
    pub auto_discover: bool,

    /// Search `~/.skillgate/skills` after `dirs`
    pub include_global: bool,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self { dirs: vec![PathBuf::from("./skills")], auto_discover: true, include_global: true }
    }
}

/// Per-session skill state settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Transition policy, fixed for a session's lifetime
    pub mode: TransitionMode,

    /// Maximum live skills under FIFO
    pub capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { mode: TransitionMode::default(), capacity: DEFAULT_FIFO_CAPACITY }
    }
}

/// Default permission context handed to new sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionsConfig {
    /// Restricted skill ids granted to every session
    pub grants: Vec<String>,

    /// Grant every restricted skill
    pub wildcard: bool,
}

/// Turn orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Model invocations allowed per user turn before giving up
    pub max_iterations: usize,

    /// Refuse to start if a catalog tool has no bound executor
    pub require_executors: bool,

    /// Extra text appended to the generated system prompt
    pub custom_instructions: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_iterations: 8, require_executors: true, custom_instructions: String::new() }
    }
}

/// File sink for logs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    /// Filter directive for the file sink only
    pub level: String,
    /// Directory for rolling files (defaults to `~/.skillgate/logs`)
    pub dir: Option<PathBuf>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self { enabled: false, level: "debug".to_string(), dir: None }
    }
}

/// Privacy controls for logged tool traffic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PrivacyLoggingConfig {
    pub log_tool_args: bool,
    /// `none`, `truncate` or `full`
    pub log_tool_output: String,
    pub truncate_length: usize,
}

impl Default for PrivacyLoggingConfig {
    fn default() -> Self {
        Self { log_tool_args: false, log_tool_output: "truncate".to_string(), truncate_length: 500 }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty`, `json` or `compact`
    pub format: String,
    pub file: FileLoggingConfig,
    pub privacy: PrivacyLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
            file: FileLoggingConfig::default(),
            privacy: PrivacyLoggingConfig::default(),
        }
    }
}

/// Root configuration structure for skillgate.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub skills: SkillsConfig,
    pub session: SessionConfig,
    pub permissions: PermissionsConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from an optional file, then apply `SKILLGATE_*` environment overrides.
    ///
    /// A missing file falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (usually the process environment)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(dir) = var("SKILLS_DIR") {
            self.skills.dirs = vec![PathBuf::from(dir)];
        }
        if let Some(mode) = var("STATE_MODE") {
            self.session.mode = mode.parse()?;
        }
        if let Some(capacity) = var("MAX_CONCURRENT_SKILLS") {
            self.session.capacity = capacity.trim().parse().map_err(|_| {
                Error::Config(ConfigError::InvalidCapacity(capacity.clone()).to_string())
            })?;
        }
        if let Some(flag) = var("AUTO_DISCOVER") {
            self.skills.auto_discover = parse_flag(&flag);
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }

        self.validate()
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.session.capacity == 0 {
            return Err(Error::Config(ConfigError::InvalidCapacity("0".to_string()).to_string()));
        }
        if self.agent.max_iterations == 0 {
            return Err(Error::Config(ConfigError::InvalidMaxIterations.to_string()));
        }
        if self.permissions.grants.iter().any(|g| g.trim().is_empty()) {
            return Err(Error::Config(ConfigError::EmptyGrant.to_string()));
        }
        Ok(())
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# skillgate configuration example

[skills]
# Bundle directories, searched in order
dirs = ["./skills"]
auto_discover = true
# Also search ~/.skillgate/skills, after the directories above
include_global = true

[session]
# Transition policy: "replace", "accumulate" or "fifo"
mode = "replace"
# Maximum live skills under fifo (must be > 0)
capacity = 3

[permissions]
# Restricted skills every session may activate
grants = []
wildcard = false

[agent]
max_iterations = 8
require_executors = true

[logging]
level = "warn"
format = "pretty"

[logging.file]
enabled = false
# Filter for the file sink, applied separately from the stderr level
level = "debug"

[logging.privacy]
log_tool_args = false
log_tool_output = "truncate"
truncate_length = 500
"#
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid state mode: {0} (must be replace, accumulate or fifo)")]
    InvalidStateMode(String),

    #[error("invalid FIFO capacity: {0} (must be a positive integer)")]
    InvalidCapacity(String),

    #[error("max_iterations must be at least 1")]
    InvalidMaxIterations,

    #[error("permission grants cannot contain empty skill ids")]
    EmptyGrant,
}
