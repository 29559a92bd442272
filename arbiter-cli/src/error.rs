use std::io;
use std::path::PathBuf;

use arbiter_core::ArbiterError;
use arbiter_rules::RuleError;

/// Failures surfaced by the `arbiter` command.
///
/// `Server` and `Transport` display their message unadorned so the caller
/// can print them after an `Error: ` prefix.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Server(String),
    #[error("{0}")]
    Transport(String),
    #[error("invalid server URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("state file {path}: {message}")]
    State { path: PathBuf, message: String },
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Rules(#[from] RuleError),
}

impl CliError {
    pub fn state(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::State {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<ArbiterError> for CliError {
    fn from(value: ArbiterError) -> Self {
        Self::Input(value.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Input(value.to_string())
    }
}
