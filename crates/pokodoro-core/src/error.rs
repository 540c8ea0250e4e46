//! Core error types for pokodoro-core.
//!
//! This module defines the error hierarchy using thiserror. Generator
//! failures are recovered inside the encounter engine and never reach the
//! phase timer; everything else propagates to the caller.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Core error type for pokodoro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Encounter generator errors
    #[error("Encounter generator error: {0}")]
    Generator(#[from] GeneratorError),

    /// No signed-in user; sessions cannot be opened
    #[error("Not authenticated: sign in before starting a session")]
    NotAuthenticated,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not determine where configuration lives
    #[error("Could not resolve data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A duration that must be positive was zero
    #[error("{field} must be a positive number of seconds")]
    NonPositiveDuration { field: &'static str },
}

/// Failures of the encounter generator call.
///
/// All of these land the coordinator in the FAILED state; none of them is
/// ever read as "no encounter occurred".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// The call did not complete in time
    #[error("Encounter generator timed out after {0:?}")]
    Timeout(Duration),

    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("Encounter generator returned HTTP {0}")]
    HttpStatus(u16),

    /// Response could not be understood
    #[error("Malformed generator response: {0}")]
    MalformedResponse(String),

    /// Generator is missing required settings
    #[error("Encounter generator not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for GeneratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GeneratorError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            GeneratorError::HttpStatus(status.as_u16())
        } else {
            GeneratorError::Network(err.to_string())
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
