//! Environment-driven configuration structures shared by all binaries.

use std::{env, path::Path, time::Duration};

use thiserror::Error;

/// HTTP surface configuration so the API binary only depends on its own
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    api_bind_address: String,
    api_unix_socket: Option<String>,
    internal_bind_address: Option<String>,
}

impl ApiConfig {
    /// Loads only the environment variables required by the API binary.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            api_bind_address: get_required_var("API_BIND_ADDRESS")?,
            api_unix_socket: get_optional_var("API_UNIX_SOCKET"),
            internal_bind_address: get_optional_var("API_INTERNAL_BIND_ADDRESS"),
        })
    }

    pub fn api_bind_address(&self) -> &str {
        &self.api_bind_address
    }

    pub fn api_unix_socket(&self) -> Option<&str> {
        self.api_unix_socket.as_deref()
    }

    pub fn internal_bind_address(&self) -> Option<&str> {
        self.internal_bind_address.as_deref()
    }

    pub fn has_internal_listener(&self) -> bool {
        self.internal_bind_address.is_some()
    }
}

/// Response cache knobs. The TTL is applied uniformly to every stored
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    ttl: Duration,
    sweep_interval: Duration,
}

impl CacheConfig {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            ttl,
            sweep_interval,
        }
    }

    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            ttl: get_duration_var("CACHE_TTL_SECS", Self::DEFAULT_TTL, Duration::from_secs)?,
            sweep_interval: get_duration_var(
                "CACHE_SWEEP_INTERVAL_SECS",
                Self::DEFAULT_SWEEP_INTERVAL,
                Duration::from_secs,
            )?,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL, Self::DEFAULT_SWEEP_INTERVAL)
    }
}

/// Timeouts for the provider fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    round_timeout: Duration,
    http_timeout: Duration,
}

impl ResolverConfig {
    pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(round_timeout: Duration, http_timeout: Duration) -> Self {
        Self {
            round_timeout,
            http_timeout,
        }
    }

    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            round_timeout: get_duration_var(
                "RESOLVER_ROUND_TIMEOUT_MS",
                Self::DEFAULT_ROUND_TIMEOUT,
                Duration::from_millis,
            )?,
            http_timeout: get_duration_var(
                "RESOLVER_HTTP_TIMEOUT_MS",
                Self::DEFAULT_HTTP_TIMEOUT,
                Duration::from_millis,
            )?,
        })
    }

    /// Hard deadline for a single fan-out round.
    pub fn round_timeout(&self) -> Duration {
        self.round_timeout
    }

    /// Upper bound for one outbound provider request.
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROUND_TIMEOUT, Self::DEFAULT_HTTP_TIMEOUT)
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    get_optional_var(key).ok_or(ConfigError::MissingVar { key })
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn get_duration_var(
    key: &'static str,
    default: Duration,
    unit: fn(u64) -> Duration,
) -> Result<Duration, ConfigError> {
    match get_optional_var(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map(unit)
            .map_err(|source| ConfigError::InvalidNumber { key, source }),
        None => Ok(default),
    }
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("CEP_GATEWAY_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    tolerate_missing(dotenvy::dotenv().map(|_| ()))
}

/// Loads one specific env file. A missing file is not an error.
pub fn hydrate_env_file_from(path: &Path) -> Result<(), ConfigError> {
    tolerate_missing(dotenvy::from_path(path))
}

fn tolerate_missing(result: Result<(), dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Ok(()) => Ok(()),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ConfigError::Dotenv { source: err }),
    }
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
