//! Transport boundary: one GET per call, raw bytes back.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// `reqwest`-backed fetcher. Every request is bounded by the client timeout so
/// abandoned fan-out calls still finish.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Request {
                url: String::new(),
                reason: format!("failed to build http client: {err}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let request_error = |err: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            reason: err.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(request_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_404_counts_as_not_found() {
        let missing = FetchError::Status {
            url: "http://example.com".into(),
            status: 404,
        };
        let broken = FetchError::Status {
            url: "http://example.com".into(),
            status: 502,
        };
        let refused = FetchError::Request {
            url: "http://example.com".into(),
            reason: "connection refused".into(),
        };
        assert!(missing.is_not_found());
        assert!(!broken.is_not_found());
        assert!(!refused.is_not_found());
    }

    #[test]
    fn builds_client_with_timeout() {
        assert!(ReqwestFetcher::new(Duration::from_millis(250)).is_ok());
    }
}
