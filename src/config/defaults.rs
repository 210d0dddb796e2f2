//! Default configuration values for hearth-mirror

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub target: TargetDefaults,
    pub walker: WalkerDefaults,
    pub locator: LocatorDefaults,
    pub poll: PollDefaults,
    pub logging: LoggingDefaults,
}

/// Default target process and runtime selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDefaults {
    pub process_name: String,
    pub assembly_name: String,
    pub runtime_version: String,
}

/// Default object graph walker bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerDefaults {
    pub max_depth: usize,
    pub max_string_length: usize,
    pub max_sequence_length: usize,
    pub retry_limit: usize,
}

/// Default runtime locator polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorDefaults {
    pub attempts: u32,
    pub retry_delay_ms: u64,
}

/// Default poller interval for the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollDefaults {
    pub interval_ms: u64,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        target: TargetDefaults {
            process_name: "Hearthstone".to_string(),
            assembly_name: "Assembly-CSharp".to_string(),
            runtime_version: "auto".to_string(),
        },
        walker: WalkerDefaults {
            max_depth: 16,
            max_string_length: 4096,
            max_sequence_length: 65536,
            retry_limit: 1,
        },
        locator: LocatorDefaults {
            attempts: 10,
            retry_delay_ms: 500,
        },
        poll: PollDefaults { interval_ms: 1000 },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}
