//! Fetch collaborators for raw classification data.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use mkn_loader::{MknError, MknResult};

/// Timeout for a single source download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Retrieves raw source content from a location.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one GET and returns the body as text.
    ///
    /// # Errors
    /// Any network failure or non-success status is
    /// [`MknError::SourceUnavailable`].
    async fn fetch(&self, url: &str) -> MknResult<String>;
}

/// HTTP fetcher backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default timeout.
    pub fn new() -> MknResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("mkn-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MknError::unavailable(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Creates a fetcher around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> MknResult<String> {
        debug!(url, "Downloading MKN-10 source");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MknError::unavailable(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MknError::unavailable(format!("GET {url} returned {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| MknError::unavailable(format!("reading body of {url}: {e}")))
    }
}

/// Fetcher that serves fixed content and counts calls.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    content: String,
    calls: AtomicUsize,
}

impl StaticFetcher {
    /// Creates a fetcher that always returns `content`.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns how many times [`Fetcher::fetch`] was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> MknResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetcher_counts_calls() {
        let fetcher = StaticFetcher::new("kod_tecka,nazev\n");
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(fetcher.fetch("ignored").await.unwrap(), "kod_tecka,nazev\n");
        fetcher.fetch("ignored").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_http_fetcher_unreachable_host_is_unavailable() {
        let fetcher = HttpFetcher::new().unwrap();
        // Port 9 on localhost: nothing listens there in test environments
        let err = fetcher.fetch("http://127.0.0.1:9/mkn10.csv").await.unwrap_err();
        assert_eq!(err.kind(), mkn_loader::ErrorKind::SourceUnavailable);
        assert!(err.to_string().starts_with("MKN-10 data unavailable"));
    }
}
