//! Configuration validator for hearth-mirror
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LocatorConfig, LoggingConfig, PollConfig, TargetConfig, WalkerConfig};

const RUNTIME_VERSIONS: [&str; 4] = ["auto", "v1", "v2", "v3"];
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_target(&config.target)?;
        Self::validate_walker(&config.walker)?;
        Self::validate_locator(&config.locator)?;
        Self::validate_poll(&config.poll)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    fn validate_target(target: &TargetConfig) -> Result<(), ConfigError> {
        if target.process_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Target process name cannot be empty".to_string(),
            ));
        }

        if target.assembly_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Target assembly name cannot be empty".to_string(),
            ));
        }

        let version = target.runtime_version.to_ascii_lowercase();
        if !RUNTIME_VERSIONS.contains(&version.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid runtime version: {}. Must be one of: {:?}",
                target.runtime_version, RUNTIME_VERSIONS
            )));
        }

        Ok(())
    }

    fn validate_walker(walker: &WalkerConfig) -> Result<(), ConfigError> {
        if walker.max_depth == 0 || walker.max_depth > 256 {
            return Err(ConfigError::Invalid(
                "Walker max depth must be between 1 and 256".to_string(),
            ));
        }

        if walker.max_string_length == 0 || walker.max_string_length > 1 << 20 {
            return Err(ConfigError::Invalid(
                "Walker max string length must be between 1 and 1048576".to_string(),
            ));
        }

        if walker.max_sequence_length == 0 || walker.max_sequence_length > 1 << 24 {
            return Err(ConfigError::Invalid(
                "Walker max sequence length must be between 1 and 16777216".to_string(),
            ));
        }

        if walker.retry_limit > 10 {
            return Err(ConfigError::Invalid(
                "Walker retry limit cannot exceed 10".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_locator(locator: &LocatorConfig) -> Result<(), ConfigError> {
        if locator.attempts == 0 {
            return Err(ConfigError::Invalid(
                "Locator attempts must be at least 1".to_string(),
            ));
        }

        if locator.retry_delay_ms > 60_000 {
            return Err(ConfigError::Invalid(
                "Locator retry delay cannot exceed 60000 ms".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_poll(poll: &PollConfig) -> Result<(), ConfigError> {
        if poll.interval_ms < 10 {
            return Err(ConfigError::Invalid(
                "Poll interval must be at least 10 ms".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, LOG_LEVELS
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
