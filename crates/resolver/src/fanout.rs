use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use cep_gateway_domain::{LookupKey, UnifiedAddress};
use metrics::{counter, histogram};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{self, Instant},
};
use tracing::{debug, warn};

use crate::providers::{AddressProvider, ProviderResult};

/// Why a single fan-out round produced no address. Every variant means "no
/// winner for this key" and triggers the next degradation step.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RoundError {
    #[error("timed out waiting for address retrieval")]
    Timeout,
    /// At least one provider answered and had nothing for the key.
    #[error("no provider returned address data")]
    NoProviderData,
    /// Every provider call failed at the transport level.
    #[error("every provider call failed")]
    ProvidersUnavailable,
}

impl RoundError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RoundError::Timeout)
    }

    /// True when the round never heard a definitive answer: it either ran
    /// out of time or no provider could be reached.
    pub fn is_timeout_flavored(&self) -> bool {
        matches!(self, RoundError::Timeout | RoundError::ProvidersUnavailable)
    }
}

/// One resolution attempt for one key. The degradation controller only
/// depends on this seam.
#[async_trait]
pub trait RoundResolver: Send + Sync {
    async fn resolve_round(&self, key: &LookupKey) -> Result<UnifiedAddress, RoundError>;
}

/// Races every provider for the same key and keeps the first success.
pub struct FanOutResolver {
    providers: Vec<Arc<dyn AddressProvider>>,
    timeout: Duration,
}

impl FanOutResolver {
    pub fn new(providers: Vec<Arc<dyn AddressProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn providers(&self) -> &[Arc<dyn AddressProvider>] {
        &self.providers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Spawns one task per provider and returns the first `Found` result seen
    /// before the deadline. Losing tasks are left to finish on their own; the
    /// channel holds one slot per provider so their sends never wait.
    pub async fn resolve(&self, key: &LookupKey) -> Result<UnifiedAddress, RoundError> {
        if self.providers.is_empty() {
            counter!("resolver_rounds_total", "result" => "no_data").increment(1);
            return Err(RoundError::NoProviderData);
        }

        let deadline = Instant::now() + self.timeout;
        let (tx, mut rx) = mpsc::channel(self.providers.len());

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let key = key.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let started = Instant::now();
                let result = provider.resolve(&key).await;
                record_outcome(provider.name(), &key, &result, started.elapsed());
                // Closed once the round is decided; the result is simply dropped.
                let _ = tx.try_send(result);
            });
        }
        drop(tx);

        let mut saw_no_data = false;
        loop {
            match time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(ProviderResult::Found(address))) => {
                    counter!("resolver_rounds_total", "result" => "found").increment(1);
                    return Ok(address);
                }
                Ok(Some(ProviderResult::NoData)) => saw_no_data = true,
                Ok(Some(ProviderResult::TransportError(_))) => continue,
                Ok(None) if saw_no_data => {
                    counter!("resolver_rounds_total", "result" => "no_data").increment(1);
                    return Err(RoundError::NoProviderData);
                }
                Ok(None) => {
                    counter!("resolver_rounds_total", "result" => "unavailable").increment(1);
                    return Err(RoundError::ProvidersUnavailable);
                }
                Err(_) => {
                    counter!("resolver_rounds_total", "result" => "timeout").increment(1);
                    return Err(RoundError::Timeout);
                }
            }
        }
    }
}

#[async_trait]
impl RoundResolver for FanOutResolver {
    async fn resolve_round(&self, key: &LookupKey) -> Result<UnifiedAddress, RoundError> {
        self.resolve(key).await
    }
}

fn record_outcome(
    provider: &'static str,
    key: &LookupKey,
    result: &ProviderResult,
    elapsed: Duration,
) {
    counter!(
        "resolver_provider_outcomes_total",
        "provider" => provider,
        "outcome" => result.outcome_label()
    )
    .increment(1);
    histogram!("resolver_provider_latency_seconds", "provider" => provider)
        .record(elapsed.as_secs_f64());

    match result {
        ProviderResult::Found(_) => debug!(provider, key = %key, "provider returned address"),
        ProviderResult::NoData => debug!(provider, key = %key, "provider has no data"),
        ProviderResult::TransportError(error) => {
            warn!(provider, key = %key, error = %error, "provider call failed")
        }
    }
}
