//! Logging setup on the tracing ecosystem.
//!
//! # Environment Variables
//!
//! - `SKILLGATE_LOG`: Filter directive (like `RUST_LOG`), e.g., `skillgate_middleware=debug`
//! - `SKILLGATE_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `SKILLGATE_LOG_DIR`: Directory for file logs (default `~/.skillgate/logs`)
//!
//! # Example
//!
//! ```no_run
//! use skillgate_core::logging;
//!
//! let _guard = logging::init_logging(None)?;
//! tracing::info!("ready");
//! # Ok::<(), skillgate_core::Error>(())
//! ```

use crate::Error;
use crate::config::{FileLoggingConfig, LoggingConfig as ConfigLoggingConfig};
use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    pub const VALUES: &[LogFormat] = &[LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

/// How to log tool output and injected instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolOutputLogging {
    /// Don't log tool output.
    #[default]
    None,
    /// Log truncated output (up to `truncate_length` chars).
    Truncate,
    /// Log full output (may include sensitive data).
    Full,
}

impl ToolOutputLogging {
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(ToolOutputLogging::None),
            "truncate" => Some(ToolOutputLogging::Truncate),
            "full" => Some(ToolOutputLogging::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolOutputLogging::None => "none",
            ToolOutputLogging::Truncate => "truncate",
            ToolOutputLogging::Full => "full",
        }
    }
}

impl FromStr for ToolOutputLogging {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolOutputLogging::parse_str(s).ok_or_else(|| format!("invalid tool output logging: {}", s))
    }
}

/// Privacy configuration for sensitive content in logs.
#[derive(Debug, Clone, Default)]
pub struct PrivacyConfig {
    /// Include tool arguments in trace logs.
    pub log_tool_args: bool,
    /// How to handle tool output in logs.
    pub log_tool_output: ToolOutputLogging,
    /// Maximum length for truncated content.
    pub truncate_length: usize,
}

/// Resolved logging settings, built from the `[logging]` config section.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<FileLoggingConfig>,
    pub privacy: PrivacyConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::default(), file: None, privacy: PrivacyConfig::default() }
    }
}

impl From<ConfigLoggingConfig> for LoggingConfig {
    fn from(config: ConfigLoggingConfig) -> Self {
        let format = LogFormat::parse_str(&config.format).unwrap_or_default();
        let log_tool_output = ToolOutputLogging::parse_str(&config.privacy.log_tool_output).unwrap_or_default();

        Self {
            level: config.level,
            format,
            file: if config.file.enabled { Some(config.file) } else { None },
            privacy: PrivacyConfig {
                log_tool_args: config.privacy.log_tool_args,
                log_tool_output,
                truncate_length: config.privacy.truncate_length,
            },
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file = Some(config);
        self
    }

    pub fn with_privacy(mut self, config: PrivacyConfig) -> Self {
        self.privacy = config;
        self
    }

    /// Build an EnvFilter from this config and environment variables.
    fn build_env_filter(&self) -> EnvFilter {
        let filter = env::var("SKILLGATE_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_else(|| self.level.clone());

        EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Filter for the file sink, independent of the stderr filter
    fn file_filter(file: &FileLoggingConfig) -> EnvFilter {
        EnvFilter::try_new(&file.level).unwrap_or_else(|_| EnvFilter::new("debug"))
    }

    fn is_tty() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    /// Determine the appropriate format for stderr output.
    fn detect_format(&self) -> LogFormat {
        if let Ok(fmt_str) = env::var("SKILLGATE_LOG_FORMAT")
            && let Some(fmt) = LogFormat::parse_str(&fmt_str)
        {
            return fmt;
        }

        if self.format == LogFormat::Pretty && !Self::is_tty() { LogFormat::Compact } else { self.format }
    }

    fn log_dir(file: &FileLoggingConfig) -> Result<PathBuf, Error> {
        if let Ok(custom_dir) = env::var("SKILLGATE_LOG_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }
        if let Some(dir) = &file.dir {
            return Ok(dir.clone());
        }

        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;

        Ok(PathBuf::from(home).join(".skillgate").join("logs"))
    }
}

/// Keeps the non-blocking file writer flushing; hold it for the life of the process.
#[must_use]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the global tracing subscriber.
///
/// Sets up an environment-based filter over formatted stderr output and, when
/// configured, a daily-rolling JSON file sink filtered at its own level.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<LoggingGuard, Error> {
    let config = config.unwrap_or_default();
    let env_filter = config.build_env_filter();

    let stderr = match config.detect_format() {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).with_ansi(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).boxed(),
    };

    let (file, guard) = match &config.file {
        Some(file_config) => {
            let log_dir = LoggingConfig::log_dir(file_config)?;
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| Error::Config(format!("Failed to create log directory: {}", e)))?;

            let file_appender = tracing_appender::rolling::daily(log_dir, "skillgate.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer =
                fmt::layer().json().with_writer(non_blocking).with_filter(LoggingConfig::file_filter(file_config));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(stderr.with_filter(env_filter))
        .with(file)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install subscriber: {}", e)))?;

    Ok(LoggingGuard { _file: guard })
}

/// Redact sensitive content from a string based on privacy settings.
pub fn redact_sensitive(content: &str, privacy: &PrivacyConfig) -> String {
    let char_count = content.chars().count();
    if char_count <= privacy.truncate_length {
        return content.to_string();
    }

    match privacy.log_tool_output {
        ToolOutputLogging::None => "[REDACTED]".to_string(),
        ToolOutputLogging::Truncate => {
            let mut truncated = content.chars().take(privacy.truncate_length).collect::<String>();
            truncated.push_str("...");
            truncated.push_str(&format!(" ({} total chars)", char_count));
            truncated
        }
        ToolOutputLogging::Full => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrivacyLoggingConfig;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::parse_str("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse_str("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse_str("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse_str("invalid"), None);
    }

    #[test]
    fn test_tool_output_logging_from_str() {
        assert_eq!("none".parse::<ToolOutputLogging>(), Ok(ToolOutputLogging::None));
        assert_eq!("TRUNCATE".parse::<ToolOutputLogging>(), Ok(ToolOutputLogging::Truncate));
        assert_eq!("full".parse::<ToolOutputLogging>(), Ok(ToolOutputLogging::Full));
        assert!("loud".parse::<ToolOutputLogging>().is_err());
    }

    #[test]
    fn test_from_config_section() {
        let section = ConfigLoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            file: FileLoggingConfig { enabled: true, ..FileLoggingConfig::default() },
            privacy: PrivacyLoggingConfig {
                log_tool_args: true,
                log_tool_output: "full".to_string(),
                truncate_length: 42,
            },
        };

        let config = LoggingConfig::from(section);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.file.is_some());
        assert!(config.privacy.log_tool_args);
        assert_eq!(config.privacy.log_tool_output, ToolOutputLogging::Full);
        assert_eq!(config.privacy.truncate_length, 42);
    }

    #[test]
    fn test_disabled_file_section_is_dropped() {
        let config = LoggingConfig::from(ConfigLoggingConfig::default());
        assert!(config.file.is_none());
        assert_eq!(config.privacy.log_tool_output, ToolOutputLogging::Truncate);
    }

    #[test]
    fn test_file_filter_uses_file_level() {
        let file = FileLoggingConfig { level: "skillgate_agent=trace".to_string(), ..FileLoggingConfig::default() };
        assert_eq!(LoggingConfig::file_filter(&file).to_string(), "skillgate_agent=trace");

        let bad = FileLoggingConfig { level: "skillgate=loud".to_string(), ..FileLoggingConfig::default() };
        assert_eq!(LoggingConfig::file_filter(&bad).to_string(), "debug");
    }

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::new().with_level("debug").with_format(LogFormat::Compact);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn test_redact_sensitive_none() {
        let privacy = PrivacyConfig { log_tool_args: false, log_tool_output: ToolOutputLogging::None, truncate_length: 100 };
        let long_content = "a".repeat(200);
        assert_eq!(redact_sensitive(&long_content, &privacy), "[REDACTED]");
        assert_eq!(redact_sensitive("short", &privacy), "short");
    }

    #[test]
    fn test_redact_sensitive_truncate() {
        let privacy =
            PrivacyConfig { log_tool_args: false, log_tool_output: ToolOutputLogging::Truncate, truncate_length: 10 };
        let redacted = redact_sensitive("abcdefghijklmnopqrstuvwxyz", &privacy);
        assert!(redacted.starts_with("abcdefghij..."));
        assert!(redacted.contains("26 total chars"));
    }

    #[test]
    fn test_redact_sensitive_multibyte() {
        let privacy =
            PrivacyConfig { log_tool_args: false, log_tool_output: ToolOutputLogging::Truncate, truncate_length: 2 };
        let redacted = redact_sensitive("数据分析", &privacy);
        assert!(redacted.starts_with("数据..."));
        assert!(redacted.contains("4 total chars"));
    }
}
