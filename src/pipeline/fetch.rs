//! Page fetching.
//!
//! The walker only needs "URL in, markup out", expressed as the
//! [`PageFetcher`] trait so tests can serve pages from memory.
//! [`HttpFetcher`] is the reqwest-backed implementation used by the CLI.
//!
//! ## Retry Strategy
//!
//! By default a failed request aborts the walk immediately. Setting
//! `max_retries` layers exponential backoff (`retry_backoff_ms * 2^attempt`)
//! on top; only connection errors, timeouts, 429 and 5xx are retried.

use crate::config::WalkConfig;
use crate::error::SerialError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// Markup of one fetched chapter page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: Url,
    pub html: String,
}

/// Source of raw chapter pages.
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<RawPage, SerialError>> + Send;
}

/// Fetches pages over HTTP(S) with reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &WalkConfig) -> Result<Self, SerialError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SerialError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs: config.fetch_timeout_secs,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    async fn fetch_once(&self, url: &Url) -> Result<RawPage, Attempt> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                Attempt::Transient(SerialError::FetchTimeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                })
            } else if e.is_connect() || e.is_request() {
                Attempt::Transient(self.failed(url, e.to_string()))
            } else {
                Attempt::Permanent(self.failed(url, e.to_string()))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = self.failed(url, format!("HTTP {status}"));
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                Attempt::Transient(err)
            } else {
                Attempt::Permanent(err)
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| Attempt::Transient(self.failed(url, e.to_string())))?;
        debug!("Fetched {} ({} bytes)", url, html.len());
        Ok(RawPage {
            url: url.clone(),
            html,
        })
    }

    fn failed(&self, url: &Url, reason: String) -> SerialError {
        SerialError::FetchFailed {
            url: url.to_string(),
            reason,
        }
    }
}

enum Attempt {
    Transient(SerialError),
    Permanent(SerialError),
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<RawPage, SerialError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(Attempt::Permanent(e)) => return Err(e),
                Err(Attempt::Transient(e)) if attempt >= self.max_retries => return Err(e),
                Err(Attempt::Transient(e)) => {
                    let backoff = self.retry_backoff_ms * 2u64.pow(attempt);
                    attempt += 1;
                    warn!(
                        "{}: attempt {} failed ({}), retrying in {}ms",
                        url, attempt, e, backoff
                    );
                    sleep(Duration::from_millis(backoff)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let config = WalkConfig::default();
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert_eq!(fetcher.max_retries, 0);
        assert_eq!(fetcher.timeout_secs, config.fetch_timeout_secs);
    }

    fn fetcher(max_retries: u32) -> HttpFetcher {
        let config = WalkConfig::builder()
            .max_retries(max_retries)
            .retry_backoff_ms(1)
            .fetch_timeout_secs(5)
            .build()
            .unwrap();
        HttpFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn server_error_is_retried_until_success() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("GET", "/1-1/")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/1-1/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<h1>Gestation 1.1</h1>")
            .expect(1)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/1-1/", server.url())).unwrap();
        let page = fetcher(1).fetch(&url).await.unwrap();

        assert_eq!(page.html, "<h1>Gestation 1.1</h1>");
        unavailable.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_without_retries_fails() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("GET", "/1-1/")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/1-1/", server.url())).unwrap();
        let err = fetcher(0).fetch(&url).await.unwrap_err();

        assert!(
            matches!(err, SerialError::FetchFailed { ref reason, .. } if reason.contains("503")),
            "got {err:?}"
        );
        unavailable.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/1-2/")
            .with_status(429)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/1-2/")
            .with_status(200)
            .with_body("page")
            .expect(1)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/1-2/", server.url())).unwrap();
        let page = fetcher(2).fetch(&url).await.unwrap();

        assert_eq!(page.html, "page");
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_is_never_retried() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/gone/")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/gone/", server.url())).unwrap();
        let err = fetcher(3).fetch(&url).await.unwrap_err();

        assert!(matches!(err, SerialError::FetchFailed { .. }), "got {err:?}");
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let config = WalkConfig::builder()
            .fetch_timeout_secs(2)
            .build()
            .unwrap();
        let fetcher = HttpFetcher::new(&config).unwrap();
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let url = Url::parse("http://127.0.0.1:9/1-1/").unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(
            matches!(
                err,
                SerialError::FetchFailed { .. } | SerialError::FetchTimeout { .. }
            ),
            "got {err:?}"
        );
    }
}
