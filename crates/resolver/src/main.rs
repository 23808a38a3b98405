//! One-off lookup binary: resolves a zip code against the live providers and
//! prints the response envelope.

use std::{env, io, sync::Arc};

use cep_gateway_domain::config::{ConfigError, ResolverConfig};
use cep_gateway_domain::services::telemetry::{init_telemetry, TelemetryConfig, TelemetryError};
use cep_gateway_domain::{KeyFormatError, LookupKey};
use cep_gateway_resolver::{
    default_providers, resolve_with_degradation, FanOutResolver, FetchError, ReqwestFetcher,
    ResolveError,
};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("usage: cep-resolve <zip-code>")]
    Usage,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("transport error: {0}")]
    Transport(#[from] FetchError),
    #[error(transparent)]
    InvalidKey(#[from] KeyFormatError),
    #[error(transparent)]
    NotFound(#[from] ResolveError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("[resolve] {err}");
        return Err(io::Error::other(err.to_string()));
    }

    Ok(())
}

async fn run() -> Result<(), CliError> {
    let raw = env::args().nth(1).ok_or(CliError::Usage)?;
    let key = LookupKey::parse(&raw)?;

    init_telemetry(&TelemetryConfig::from_env("RESOLVER"))?;
    let config = ResolverConfig::load_from_env()?;

    let fetcher = Arc::new(ReqwestFetcher::new(config.http_timeout())?);
    let resolver = FanOutResolver::new(default_providers(fetcher), config.round_timeout());

    let address = resolve_with_degradation(&resolver, key).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "data": address }))?
    );
    Ok(())
}
