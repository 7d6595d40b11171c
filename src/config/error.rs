//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Routing threshold must be between 0.0 and 1.0")]
    InvalidRoutingThreshold,

    #[error("Confirmation threshold must be between 0.0 and 1.0")]
    InvalidConfirmationThreshold,

    #[error("Conversation memory capacity must be between 1 and 64")]
    InvalidMemoryCapacity,
}
