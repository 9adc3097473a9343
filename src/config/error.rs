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
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),

    #[error("API v3 key must be 32 bytes, got {0}")]
    InvalidApiV3KeyLength(usize),

    #[error("Invalid API base URL format")]
    InvalidApiBaseUrl,

    #[error("API base URL must use HTTPS in production")]
    ApiBaseUrlMustBeHttps,

    #[error("Certificate refresh attempts must be between 1 and 10")]
    InvalidRefreshAttempts,
}
