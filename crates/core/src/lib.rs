pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::{
    AgentConfig, Config, ConfigError, DEFAULT_FIFO_CAPACITY, ENV_PREFIX, FileLoggingConfig, LoggingConfig, PermissionsConfig, PrivacyLoggingConfig,
    SessionConfig, SkillsConfig, TransitionMode,
};
pub use error::{Error, Result, SessionError};
pub use session::{SessionId, SessionIdError};
