//! HTTP fetching for robots.txt, sitemaps and article pages.
//!
//! One [`Fetcher`] is built per crawl run and shared by every stage.

use crate::{CrawlConfig, Error, Result};
use reqwest::Client;
use reqwest::header::LAST_MODIFIED;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Outcome of one GET request that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body; empty unless the status is 2xx.
    pub body: String,
    /// Raw `Last-Modified` header value.
    pub last_modified: Option<String>,
}

impl FetchResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// HTTP client shared by every stage of a crawl run
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with the given user agent and per-request timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Creates a fetcher from a crawl configuration
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        Self::new(&config.user_agent, config.request_timeout)
    }

    /// Issues a GET request.
    ///
    /// Only transport failures (DNS, connect, timeout, broken body) are
    /// errors; any HTTP status is returned as a [`FetchResponse`]. Bodies of
    /// non-2xx responses are not downloaded.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        let body = if status.is_success() {
            response.text().await?
        } else {
            String::new()
        };

        debug!("GET {} -> {} ({} bytes)", url, status.as_u16(), body.len());

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
            last_modified,
        })
    }

    /// Fetches a text document, logging and swallowing every failure.
    ///
    /// Used for robots.txt and sitemaps, where an unreachable document is
    /// treated as empty.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get_document(&self, url: &str) -> Option<String> {
        match self.get(url).await {
            Ok(response) if response.is_success() => Some(response.body),
            Ok(response) => {
                warn!("Failed to fetch {}: HTTP {}", url, response.status);
                None
            },
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                None
            },
        }
    }
}
