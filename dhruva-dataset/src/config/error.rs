//! Configuration errors.

use thiserror::Error;

/// Error loading or validating a configuration file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigLoadError {
    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
