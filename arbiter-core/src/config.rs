use std::env;

use crate::errors::{ArbiterError, ConfigError};

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Global configuration shared by the Arbiter binaries.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: Option<String>,
    pub environment: Environment,
    pub node_name: String,
    pub http_bind: Option<String>,
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    ///
    /// `DATABASE_URL` is optional; without it the service keeps rules in memory.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = non_empty_var("DATABASE_URL")?;
        let environment = env::var("ARBITER_ENV")
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();
        let node_name =
            env::var("ARBITER_NODE_NAME").unwrap_or_else(|_| "arbiter-node".to_string());
        let http_bind = non_empty_var("ARBITER_HTTP_BIND")?;

        Ok(Self {
            database_url,
            environment,
            node_name,
            http_bind,
        })
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `RULES_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let database_url = non_empty_var(&key("DATABASE_URL"))?;
        let environment = env::var(key("ENV"))
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();
        let node_name = env::var(key("NODE_NAME")).unwrap_or_else(|_| "arbiter-node".to_string());
        let http_bind = non_empty_var(&key("HTTP_BIND"))?;

        Ok(Self {
            database_url,
            environment,
            node_name,
            http_bind,
        })
    }

    /// Returns the Postgres URL when one is configured.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn non_empty_var(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        }),
    }
}

/// Helper that loads config and converts to the canonical Arbiter error type.
pub fn load_core_config() -> Result<CoreConfig, ArbiterError> {
    Ok(CoreConfig::from_env()?)
}
