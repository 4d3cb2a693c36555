//! Error types for cache options
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Options Error Enum ==
/// Unified error type for option parsing and application.
#[derive(Error, Debug)]
pub enum OptionsError {
    /// Value does not match the accepted size grammar, or overflows a byte count
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Value has a shape the option cannot accept (e.g. a boolean or array)
    #[error("Invalid value for option '{option}': {reason}")]
    InvalidValue { option: String, reason: String },

    /// No setter exists for the given option name
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// Configuration source could not be read
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for OptionsError {
    fn from(err: serde_json::Error) -> Self {
        OptionsError::Config(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache options.
pub type Result<T> = std::result::Result<T, OptionsError>;
