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
///
/// Only the listening setup is validated fatally. Missing external service
/// keys are reported through `AppConfig::missing_keys` and logged without
/// halting startup; the affected capability fails per-request instead.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Completion temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("Completion max_tokens must be greater than zero")]
    InvalidMaxTokens,
}
