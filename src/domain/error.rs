//! Domain error types

use thiserror::Error;

/// Error when parsing an audio format name
#[derive(Debug, Clone, Error)]
#[error("Invalid audio format: \"{input}\". Run 'chat-composer formats' to list supported formats")]
pub struct InvalidFormatError {
    pub input: String,
}

/// Error when capture settings hold an unusable value
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid capture setting '{field}': {message}")]
pub struct InvalidSettingsError {
    pub field: &'static str,
    pub message: &'static str,
}

impl InvalidSettingsError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
