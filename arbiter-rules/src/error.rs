use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the rules engine when parsing, combining, evaluating,
/// loading or storing rules.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid rule string")]
    InvalidRule { reason: String },
    #[error("unexpected input at offset {offset}: {message}")]
    Lex { offset: usize, message: String },
    #[error("failed to parse rule: {0}")]
    Parse(String),
    #[error("rule tree would nest deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("No rules to combine")]
    NothingToCombine,
    #[error("malformed rule AST: {0}")]
    MalformedAst(String),
    #[error("evaluation data must be a JSON object, got {0}")]
    InvalidData(&'static str),
    #[error("cannot apply '{operator}' to {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: String,
        right: String,
    },
    #[error("rule {0} not found")]
    NotFound(String),
    #[error("rule storage failed: {0}")]
    Storage(String),
    #[error("rules path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read rules from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load rules from {path}: {message}")]
    Load { path: String, message: String },
}

impl RuleError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        RuleError::InvalidRule {
            reason: reason.into(),
        }
    }

    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn load_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RuleError::Load {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for RuleError {
    fn from(err: sqlx::Error) -> Self {
        RuleError::Storage(err.to_string())
    }
}

impl From<arbiter_core::ArbiterError> for RuleError {
    fn from(err: arbiter_core::ArbiterError) -> Self {
        RuleError::Storage(err.to_string())
    }
}
