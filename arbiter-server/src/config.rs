use std::env;
use std::str::FromStr;
use std::time::Duration;

use arbiter_core::errors::ConfigError;
use arbiter_core::CoreConfig;

const DEFAULT_BIND: &str = "0.0.0.0:8081";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub core: CoreConfig,
    pub bind_address: String,
    pub allowed_origins: Vec<String>,
    pub max_concurrent_requests: usize,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let core = CoreConfig::from_env()?;
        Self::from_lookup(core, |key| env::var(key))
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(core: CoreConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, env::VarError>,
    {
        let bind_address = read_string(&lookup, "ARBITER_BIND")?
            .or_else(|| core.http_bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let allowed_origins = read_string(&lookup, "ARBITER_ALLOWED_ORIGINS")?
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let max_concurrent_requests = parse_var::<usize, _>(&lookup, "ARBITER_MAX_CONCURRENCY", 128)?;
        let request_timeout_ms = parse_var::<u64, _>(&lookup, "ARBITER_REQUEST_TIMEOUT_MS", 15_000)?;
        let max_body_bytes = parse_var::<usize, _>(&lookup, "ARBITER_MAX_BODY_BYTES", 1024 * 1024)?;

        Ok(Self {
            core,
            bind_address,
            allowed_origins,
            max_concurrent_requests: max_concurrent_requests.max(1),
            request_timeout: Duration::from_millis(request_timeout_ms.max(100)),
            max_body_bytes: max_body_bytes.max(1024),
        })
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

fn read_string<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&'static str) -> Result<String, env::VarError>,
{
    match lookup(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidEnvVar { key, source: err }),
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&'static str) -> Result<String, env::VarError>,
{
    match read_string(lookup, key)? {
        Some(value) => T::from_str(&value).map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        }),
        None => Ok(default),
    }
}
