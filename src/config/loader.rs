//! Configuration loader for hearth-mirror
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "hearth-mirror.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_target")]
    pub target: TargetConfig,

    #[serde(default = "default_walker")]
    pub walker: WalkerConfig,

    #[serde(default = "default_locator")]
    pub locator: LocatorConfig,

    #[serde(default = "default_poll")]
    pub poll: PollConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Which process to attach to and which runtime image to read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_process_name")]
    pub process_name: String,
    #[serde(default = "default_assembly_name")]
    pub assembly_name: String,
    /// `auto`, `v1`, `v2` or `v3`
    #[serde(default = "default_runtime_version")]
    pub runtime_version: String,
}

/// Bounds applied while decoding object graphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_string_length")]
    pub max_string_length: usize,
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,
    #[serde(default = "default_retry_limit")]
    pub retry_limit: usize,
}

/// Polling policy while waiting for the runtime to come up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl LocatorConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Binary poller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file is absent
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::new(DEFAULT_CONFIG_FILE).load_or_default()
}

// Default functions for serde
fn default_target() -> TargetConfig {
    let defaults = default_config();
    TargetConfig {
        process_name: defaults.target.process_name,
        assembly_name: defaults.target.assembly_name,
        runtime_version: defaults.target.runtime_version,
    }
}

fn default_walker() -> WalkerConfig {
    let defaults = default_config();
    WalkerConfig {
        max_depth: defaults.walker.max_depth,
        max_string_length: defaults.walker.max_string_length,
        max_sequence_length: defaults.walker.max_sequence_length,
        retry_limit: defaults.walker.retry_limit,
    }
}

fn default_locator() -> LocatorConfig {
    let defaults = default_config();
    LocatorConfig {
        attempts: defaults.locator.attempts,
        retry_delay_ms: defaults.locator.retry_delay_ms,
    }
}

fn default_poll() -> PollConfig {
    PollConfig {
        interval_ms: default_config().poll.interval_ms,
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_config().logging.level,
    }
}

// Individual field defaults
fn default_process_name() -> String {
    default_config().target.process_name
}

fn default_assembly_name() -> String {
    default_config().target.assembly_name
}

fn default_runtime_version() -> String {
    default_config().target.runtime_version
}

fn default_max_depth() -> usize {
    default_config().walker.max_depth
}

fn default_max_string_length() -> usize {
    default_config().walker.max_string_length
}

fn default_max_sequence_length() -> usize {
    default_config().walker.max_sequence_length
}

fn default_retry_limit() -> usize {
    default_config().walker.retry_limit
}

fn default_attempts() -> u32 {
    default_config().locator.attempts
}

fn default_retry_delay_ms() -> u64 {
    default_config().locator.retry_delay_ms
}

fn default_interval_ms() -> u64 {
    default_config().poll.interval_ms
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: default_target(),
            walker: default_walker(),
            locator: default_locator(),
            poll: default_poll(),
            logging: default_logging(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        default_target()
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        default_walker()
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        default_locator()
    }
}
