use std::io;

use thiserror::Error;

/// Result type used across the Arbiter core crate.
pub type Result<T> = std::result::Result<T, ArbiterError>;

/// Canonical error representation shared by the service and the CLI.
#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("logging setup failed: {0}")]
    LoggingError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for ArbiterError {
    fn from(err: serde_json::Error) -> Self {
        ArbiterError::DeserializationError(err.to_string())
    }
}

impl From<sqlx::Error> for ArbiterError {
    fn from(err: sqlx::Error) -> Self {
        ArbiterError::DatabaseError(err.to_string())
    }
}

impl From<anyhow::Error> for ArbiterError {
    fn from(err: anyhow::Error) -> Self {
        ArbiterError::GeneralError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration loaders.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {source}")]
    InvalidEnvVar {
        key: &'static str,
        #[source]
        source: std::env::VarError,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("internal configuration error: {0}")]
    Internal(String),
}

impl From<ConfigError> for ArbiterError {
    fn from(value: ConfigError) -> Self {
        ArbiterError::ConfigError(value.to_string())
    }
}
