//! HTTP page fetching for the extraction pipeline.
//!
//! Pages are requested with browser-like headers to reduce anti-bot
//! rejections and a bounded timeout. A failed fetch is never retried; the
//! error goes straight back to the caller so unreachable sources surface
//! quickly.

use crate::config::FetchConfig;
use crate::models::Document;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Page fetch failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("timed out fetching {url}")]
    Timeout { url: String },
    #[error("network failure fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("invalid header value {value:?}: {reason}")]
    InvalidHeader { value: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

/// Fetches raw HTML for article URLs.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher with the configured headers and timeout.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let header = |value: &str| {
            HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
                value: value.to_string(),
                reason: e.to_string(),
            })
        };
        headers.insert(ACCEPT, header(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header(&config.accept_language)?);
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    /// Fetch a page and return it as an immutable [`Document`].
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] for unparseable or non-HTTP URLs
    /// - [`FetchError::Timeout`] when the configured timeout elapses
    /// - [`FetchError::Status`] for any non-2xx response
    /// - [`FetchError::Network`] for connection or body-read failures
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let t0 = Instant::now();
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Fetch returned non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        info!(
            bytes = html.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        debug!(status = status.as_u16(), "Fetch complete");
        Ok(Document::new(url, html))
    }
}
