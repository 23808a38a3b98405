use std::sync::Arc;

#[cfg(unix)]
use std::{fs, path::Path};

use actix_web::{dev::HttpServiceFactory, middleware::Logger, web, App, HttpServer};
use cep_gateway_domain::config::{ApiConfig, CacheConfig, ConfigError, ResolverConfig};
use cep_gateway_domain::services::{
    cache::ResponseCache,
    telemetry::{init_telemetry, TelemetryConfig, TelemetryError},
};
use cep_gateway_resolver::{default_providers, FanOutResolver, FetchError, ReqwestFetcher};
use thiserror::Error;
use tracing::info;

use crate::{
    handlers::{health_handler, metrics_handler, zip_code_handler},
    middleware::CacheGate,
    state::AppState,
};

pub async fn run() -> Result<(), BootstrapError> {
    let config = ApiConfig::load_from_env()?;
    let cache_config = CacheConfig::load_from_env()?;
    let resolver_config = ResolverConfig::load_from_env()?;

    let telemetry_config = TelemetryConfig::from_env("API");
    let telemetry = init_telemetry(&telemetry_config)?;

    let fetcher = Arc::new(ReqwestFetcher::new(resolver_config.http_timeout())?);
    let resolver = Arc::new(FanOutResolver::new(
        default_providers(fetcher),
        resolver_config.round_timeout(),
    ));
    info!(
        providers = resolver.providers().len(),
        round_timeout_ms = resolver.timeout().as_millis() as u64,
        "resolver ready"
    );

    let cache = Arc::new(ResponseCache::new());
    let sweeper = cache.spawn_sweeper(cache_config.sweep_interval());
    let gate = CacheGate::new(Arc::clone(&cache), cache_config.ttl());

    let state = AppState::new(resolver, telemetry.clone());

    // With a dedicated internal listener, metrics stay off the public port.
    let include_metrics_on_public = !config.has_internal_listener();

    let public_state = state.clone();
    let mut public_server = HttpServer::new(move || {
        let mut app = App::new()
            .app_data(web::Data::new(public_state.clone()))
            .wrap(Logger::default())
            .route("/health", web::get().to(health_handler))
            .service(zip_code_scope(gate.clone()));

        if include_metrics_on_public {
            app = app.route("/metrics", web::get().to(metrics_handler));
        }

        app
    });

    #[cfg(unix)]
    {
        if let Some(socket) = config.api_unix_socket() {
            cleanup_socket(socket)?;
            public_server = public_server.bind_uds(socket)?;
        } else {
            public_server = public_server.bind(config.api_bind_address())?;
        }
    }

    #[cfg(not(unix))]
    {
        if let Some(socket) = config.api_unix_socket() {
            return Err(BootstrapError::Io(std::io::Error::other(format!(
                "unix socket '{socket}' requested but this platform does not support it"
            ))));
        }
        public_server = public_server.bind(config.api_bind_address())?;
    }

    let public_server = public_server.run();

    let internal_server = match config.internal_bind_address() {
        Some(addr) => {
            let internal_state = state.clone();
            let internal_server = HttpServer::new(move || {
                App::new()
                    .app_data(web::Data::new(internal_state.clone()))
                    .wrap(Logger::default())
                    .route("/health", web::get().to(health_handler))
                    .route("/metrics", web::get().to(metrics_handler))
            })
            .bind(addr)?;
            Some(internal_server.run())
        }
        None => None,
    };

    let served = if let Some(internal) = internal_server {
        tokio::try_join!(public_server, internal).map(|_| ())
    } else {
        public_server.await
    };

    sweeper.abort();
    served?;
    Ok(())
}

/// The zip-code lookup route, behind the response cache.
pub fn zip_code_scope(gate: CacheGate) -> impl HttpServiceFactory {
    web::scope("/api/v1")
        .wrap(gate)
        .route("/zip-code/{zip_code}", web::get().to(zip_code_handler))
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("http client error: {0}")]
    HttpClient(#[from] FetchError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// A stale socket file from an unclean shutdown makes bind fail.
#[cfg(unix)]
fn cleanup_socket(path: &str) -> std::io::Result<()> {
    let socket_path = Path::new(path);
    if socket_path.exists() {
        fs::remove_file(socket_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #[cfg(unix)]
    #[actix_web::test]
    async fn cleanup_socket_removes_stale_file() {
        use super::cleanup_socket;

        let path = std::env::temp_dir().join(format!(
            "cep-gateway-test-{}-{}.sock",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::write(&path, b"stub").expect("write socket file");
        cleanup_socket(path.to_str().unwrap()).expect("cleanup succeeds");
        assert!(!path.exists());
    }
}
