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

    #[error("Invalid listen address")]
    InvalidSocketAddress,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid school API base URL")]
    InvalidBaseUrl,

    #[error("School API base URL must use HTTPS in production")]
    BaseUrlMustBeHttps,

    #[error("School API key is required in production")]
    MissingApiKey,

    #[error("Poll interval must be at least 1 second")]
    InvalidPollInterval,

    #[error("Dedup ledger capacity must be greater than zero")]
    InvalidLedgerCapacity,
}
