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

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Broker topic cannot be empty")]
    EmptyTopic,

    #[error("Batch limit must be at least 1")]
    ZeroBatchLimit,

    #[error("Error backoff base must be at least 1ms")]
    ZeroBackoffBase,

    #[error("Error backoff base exceeds cap")]
    BackoffBaseExceedsCap,
}
