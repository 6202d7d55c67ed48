//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests for pages
//! - HEAD requests and capped streamed reads used to probe images
//! - Classifying transport failures apart from HTTP statuses

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Transport-level fetch failure
///
/// HTTP error statuses (404, 500, ...) are not fetch failures; they arrive as a
/// successful [`FetchedResponse`] carrying that status.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_connect() {
            FetchError::Connect(error.to_string())
        } else {
            FetchError::Request(error.to_string())
        }
    }
}

/// A fetched page response
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: StatusCode,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body decoded as text
    pub body: String,
}

/// Result of a HEAD request
#[derive(Debug, Clone)]
pub struct HeadResponse {
    /// HTTP status code
    pub status: StatusCode,

    /// Response headers
    pub headers: HeaderMap,
}

impl HeadResponse {
    /// Content-Type header value, lowercased
    pub fn content_type(&self) -> Option<String> {
        header_str(&self.headers, CONTENT_TYPE.as_str()).map(|v| v.to_ascii_lowercase())
    }

    /// Content-Length header value, only trusted on successful responses
    pub fn content_length(&self) -> Option<u64> {
        if !self.status.is_success() {
            return None;
        }
        header_str(&self.headers, CONTENT_LENGTH.as_str()).and_then(|v| v.trim().parse().ok())
    }
}

/// Outcome of a capped streamed download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySize {
    /// The whole body was read and has this many bytes
    Exact(u64),

    /// Reading stopped after more than this many bytes
    Exceeds(u64),
}

impl BodySize {
    /// Returns true when the body is larger than `limit` bytes
    pub fn is_over(&self, limit: u64) -> bool {
        match *self {
            BodySize::Exact(bytes) => bytes > limit,
            BodySize::Exceeds(cap) => cap >= limit,
        }
    }
}

/// HTTP fetcher shared by the crawl engine and the visitors
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    probe_timeout: Duration,
}

impl Fetcher {
    /// Builds a fetcher with proper configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use seo_sweep::config::Config;
    /// use seo_sweep::crawler::Fetcher;
    ///
    /// let config = Config::default();
    /// let fetcher = Fetcher::new(&config.crawler, &config.user_agent).unwrap();
    /// ```
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(crawler, user_agent)?;
        Ok(Self {
            client,
            probe_timeout: Duration::from_secs(crawler.image_probe_timeout_secs),
        })
    }

    /// Fetches a page
    ///
    /// Any HTTP status is returned as `Ok`; only connection errors, timeouts, DNS
    /// failures and body read failures are errors.
    pub async fn get(&self, url: &Url) -> Result<FetchedResponse, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(FetchedResponse {
            final_url,
            status,
            headers,
            body,
        })
    }

    /// Sends a HEAD request with the probe timeout
    pub async fn head(&self, url: &Url) -> Result<HeadResponse, FetchError> {
        let response = self
            .client
            .head(url.clone())
            .timeout(self.probe_timeout)
            .send()
            .await?;

        Ok(HeadResponse {
            status: response.status(),
            headers: response.headers().clone(),
        })
    }

    /// Measures a resource body by streaming it, stopping once `cap` bytes are exceeded
    ///
    /// Returns None when the server answers with a non-2xx status; an error page is
    /// not the resource.
    pub async fn probe_size(&self, url: &Url, cap: u64) -> Result<Option<BodySize>, FetchError> {
        let mut response = self
            .client
            .get(url.clone())
            .timeout(self.probe_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("Not measuring {}: HTTP {}", url, response.status());
            return Ok(None);
        }

        let mut total: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            total += chunk.len() as u64;
            if total > cap {
                return Ok(Some(BodySize::Exceeds(cap)));
            }
        }

        Ok(Some(BodySize::Exact(total)))
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed with reqwest's default policy; both HTTP and HTTPS are
/// allowed since plain-HTTP pages are part of what the security report looks for.
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Reads a header as a string, ignoring non-UTF-8 values
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
