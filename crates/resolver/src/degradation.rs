use cep_gateway_domain::{LookupKey, UnifiedAddress, LOOKUP_KEY_LEN};
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, info};

use crate::fanout::{RoundError, RoundResolver};

/// Terminal failure after the whole degradation sequence. Callers always see
/// the round-timeout message; the last round's actual reason is kept for
/// status codes and diagnostics only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("timed out waiting for address retrieval")]
    NotFound { attempts: usize, last: RoundError },
}

impl ResolveError {
    pub fn attempts(&self) -> usize {
        match self {
            ResolveError::NotFound { attempts, .. } => *attempts,
        }
    }

    pub fn last_round(&self) -> RoundError {
        match self {
            ResolveError::NotFound { last, .. } => *last,
        }
    }

    /// No provider gave a definitive "no data" answer on the last round.
    pub fn is_timeout_flavored(&self) -> bool {
        self.last_round().is_timeout_flavored()
    }
}

/// Resolves `key`, zeroing its right-most non-zero digit after every failed
/// round. Stops as soon as the next key would be all zeros, so an input that
/// is already all zeros is tried exactly once. Rounds are strictly sequential
/// and each one gets the resolver's full timeout.
pub async fn resolve_with_degradation<R>(
    resolver: &R,
    key: LookupKey,
) -> Result<UnifiedAddress, ResolveError>
where
    R: RoundResolver + ?Sized,
{
    let mut current = key;
    let mut last = RoundError::NoProviderData;

    for attempt in 1..=LOOKUP_KEY_LEN {
        match resolver.resolve_round(&current).await {
            Ok(address) => {
                histogram!("resolver_degradation_attempts").record(attempt as f64);
                info!(key = %current, attempt, "zip code resolved");
                return Ok(address);
            }
            Err(err) => {
                debug!(key = %current, attempt, reason = ?err, "round failed");
                last = err;
            }
        }

        let next = current.degrade();
        if next.is_all_zero() {
            return Err(exhausted(attempt, last));
        }
        current = next;
    }

    Err(exhausted(LOOKUP_KEY_LEN, last))
}

fn exhausted(attempts: usize, last: RoundError) -> ResolveError {
    histogram!("resolver_degradation_attempts").record(attempts as f64);
    counter!("resolver_not_found_total").increment(1);
    ResolveError::NotFound { attempts, last }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedRounds {
        succeed_on: Option<&'static str>,
        failure: RoundError,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedRounds {
        fn failing(failure: RoundError) -> Self {
            Self {
                succeed_on: None,
                failure,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn succeeding_on(key: &'static str) -> Self {
            Self {
                succeed_on: Some(key),
                ..Self::failing(RoundError::NoProviderData)
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RoundResolver for ScriptedRounds {
        async fn resolve_round(&self, key: &LookupKey) -> Result<UnifiedAddress, RoundError> {
            self.seen.lock().unwrap().push(key.as_str().to_string());
            if self.succeed_on == Some(key.as_str()) {
                Ok(UnifiedAddress::new("Praça da Sé", "Sé", "São Paulo", "SP"))
            } else {
                Err(self.failure)
            }
        }
    }

    fn key(raw: &str) -> LookupKey {
        LookupKey::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn first_round_success_returns_immediately() {
        let rounds = ScriptedRounds::succeeding_on("01001000");
        let address = resolve_with_degradation(&rounds, key("01001000"))
            .await
            .expect("resolves");
        assert_eq!(address.city, "São Paulo");
        assert_eq!(rounds.seen(), ["01001000"]);
    }

    #[tokio::test]
    async fn degrades_until_a_round_succeeds() {
        let rounds = ScriptedRounds::succeeding_on("01001000");
        let address = resolve_with_degradation(&rounds, key("01001234")).await;
        assert!(address.is_ok());
        assert_eq!(
            rounds.seen(),
            ["01001234", "01001230", "01001200", "01001000"]
        );
    }

    #[tokio::test]
    async fn stops_before_trying_the_zero_key() {
        let rounds = ScriptedRounds::failing(RoundError::Timeout);
        let err = resolve_with_degradation(&rounds, key("00000011"))
            .await
            .unwrap_err();
        assert_eq!(rounds.seen(), ["00000011", "00000010"]);
        assert_eq!(
            err,
            ResolveError::NotFound {
                attempts: 2,
                last: RoundError::Timeout
            }
        );
        assert_eq!(err.to_string(), "timed out waiting for address retrieval");
    }

    #[tokio::test]
    async fn zero_key_is_attempted_once() {
        let rounds = ScriptedRounds::failing(RoundError::NoProviderData);
        let err = resolve_with_degradation(&rounds, LookupKey::zero())
            .await
            .unwrap_err();
        assert_eq!(rounds.seen(), ["00000000"]);
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.last_round(), RoundError::NoProviderData);
        assert!(!err.is_timeout_flavored());
    }

    #[tokio::test]
    async fn unreachable_providers_surface_the_timeout_message() {
        let rounds = ScriptedRounds::failing(RoundError::ProvidersUnavailable);
        let err = resolve_with_degradation(&rounds, key("00000011"))
            .await
            .unwrap_err();
        assert_eq!(err.attempts(), 2);
        assert!(err.is_timeout_flavored());
        assert_eq!(err.to_string(), "timed out waiting for address retrieval");
    }

    #[tokio::test]
    async fn never_exceeds_one_round_per_digit() {
        let rounds = ScriptedRounds::failing(RoundError::NoProviderData);
        let err = resolve_with_degradation(&rounds, key("12345678"))
            .await
            .unwrap_err();
        assert_eq!(
            rounds.seen(),
            [
                "12345678", "12345670", "12345600", "12345000", "12340000", "12300000",
                "12000000", "10000000"
            ]
        );
        assert_eq!(err.attempts(), LOOKUP_KEY_LEN);
    }
}
