//! Errors raised while reading configuration from the environment

use thiserror::Error;

/// An environment variable could not be turned into a setting
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The variable is set to something unusable
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
