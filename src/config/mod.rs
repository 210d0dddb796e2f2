//! Configuration module for hearth-mirror
//!
//! Provides configuration loading, validation, and default settings for the
//! target selection, walker bounds, locator polling and logging.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{
    load_config, Config, ConfigError, ConfigLoader, LocatorConfig, LoggingConfig, PollConfig,
    TargetConfig, WalkerConfig, DEFAULT_CONFIG_FILE,
};
pub use validator::{validate_config, ConfigValidator};

pub type ConfigResult<T> = Result<T, ConfigError>;
