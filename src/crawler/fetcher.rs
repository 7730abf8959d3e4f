//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Fetching the root page of a crawl
//! - The `PageSource` seam the content pool fetches through
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::AtlasError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Success status but nothing in the body
    EmptyBody,

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops) and responses are transparently
/// decompressed.
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use doc_atlas::config::UserAgentConfig;
/// use doc_atlas::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and returns its HTML
///
/// Transport failures and non-success statuses are both errors; this is used
/// for the root page of a crawl, where either one ends the crawl.
pub async fn fetch_webpage(client: &Client, url: &str) -> Result<String, AtlasError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| AtlasError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AtlasError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| AtlasError::Http {
        url: url.to_string(),
        source,
    })
}

/// Classifies a single GET into a `FetchResult`
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) if body.trim().is_empty() => FetchResult::EmptyBody,
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchResult::NetworkError { error }
        }
    }
}

/// Where the content pool gets page HTML from
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_html(&self, url: &str) -> FetchResult;
}

/// Builds one `PageSource` per worker thread
pub type SourceFactory = Arc<dyn Fn() -> Result<Arc<dyn PageSource>, AtlasError> + Send + Sync>;

/// `PageSource` backed by a reqwest client
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// A factory that builds a fresh client for every worker
    ///
    /// Each worker drives its own runtime, so clients are not shared across
    /// workers.
    pub fn factory(user_agent: UserAgentConfig, crawler: &CrawlerConfig) -> SourceFactory {
        let timeout = Duration::from_secs(crawler.request_timeout_secs);
        Arc::new(move || -> Result<Arc<dyn PageSource>, AtlasError> {
            let client = build_http_client(&user_agent, timeout)?;
            Ok(Arc::new(HttpPageSource::new(client)))
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_html(&self, url: &str) -> FetchResult {
        fetch_url(&self.client, url).await
    }
}
