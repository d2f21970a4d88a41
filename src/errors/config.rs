// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while reading or validating an `EngineConfig`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config '{path}': {reason}")]
    Io { path: String, reason: String },

    /// The config file is not valid YAML for `EngineConfig`.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A setting or environment override holds an unusable value.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(error: serde_yaml::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}
