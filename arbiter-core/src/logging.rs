use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::{ArbiterError, Result};

/// Initializes the default tracing subscriber used by the binaries.
///
/// `RUST_LOG` wins over `level` when it is set.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    let default_level = level.unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .try_init()
        .map_err(|err| ArbiterError::LoggingError(err.to_string()))?;

    Ok(())
}

/// Same as [`init_tracing`] but writes to stderr, keeping stdout free for
/// command output.
pub fn init_cli_tracing(level: Option<&str>) -> Result<()> {
    let default_level = level.unwrap_or("warn");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init()
        .map_err(|err| ArbiterError::LoggingError(err.to_string()))?;

    Ok(())
}
