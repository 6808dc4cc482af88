//! Configuration for crawl runs and feed synchronization.
//!
//! Two layers exist:
//!
//! 1. **[`CrawlConfig`]**: everything one pipeline run needs. Built in code
//!    or from CLI flags, immutable for the duration of the run.
//! 2. **[`SyncConfig`]**: the JSON feeds file consumed by `sitemap2posts sync`.
//!    Each [`FeedConfig`] converts into a [`CrawlConfig`].
//!
//! ## Example feeds file
//!
//! ```json
//! {
//!     "feeds": [
//!         {
//!             "feed_id": "6f1c0f36-8a0b-4f0e-9a57-0c4b2b1f3c55",
//!             "profile_id": "f1d3b7a2-1c34-4c1e-8d5b-8a6a4b1d2c3e",
//!             "mode": "sitemap_urls",
//!             "sitemap_urls": [
//!                 "https://example.com/blog/",
//!                 "https://example.com/post-sitemap.xml"
//!             ],
//!             "lastmod_min": "2024-01-01",
//!             "path_ignore_list": ["*/tag/*"],
//!             "remove_404_records": true,
//!             "preferred_date_order": "PLHM"
//!         }
//!     ]
//! }
//! ```

use crate::{DateOrder, Error, Result, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Title used for pages without one under [`TitlePolicy::Placeholder`].
pub const PLACEHOLDER_TITLE: &str = "No Title";

/// Number of pages fetched concurrently by default.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Upper bound for the extraction worker count.
pub const MAX_CONCURRENCY: usize = 50;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What to do with a page whose HTML has no title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitlePolicy {
    /// Keep the post with [`PLACEHOLDER_TITLE`].
    #[default]
    Placeholder,
    /// Drop the post.
    Require,
}

/// Inputs of one pipeline run.
///
/// ```rust
/// use sitemap2posts_core::CrawlConfig;
///
/// let config = CrawlConfig::new("https://example.com/blog/")
///     .with_sitemap_urls(vec!["https://example.com/sitemap.xml".to_string()])
///     .with_ignore_list(vec!["*/drafts/*".to_string()])
///     .with_remove_404(true);
///
/// assert_eq!(config.concurrency, 10);
/// assert!(config.remove_404);
/// ```
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Site root: robots.txt is looked up against it and every post URL
    /// must start with it.
    pub base_url: String,
    /// Explicit sitemap list; bypasses robots.txt when set.
    pub sitemap_urls: Option<Vec<String>>,
    /// Inclusive floor for post dates.
    pub lastmod_min: Option<Timestamp>,
    /// Glob patterns a URL must match at least one of (when non-empty).
    pub path_allow_list: Vec<String>,
    /// Glob patterns that exclude a URL.
    pub path_ignore_list: Vec<String>,
    /// Sitemap URLs never fetched.
    pub ignore_sitemaps: HashSet<String>,
    /// Drop pages that answer 404 without parsing them.
    pub remove_404: bool,
    /// Priority of the four date sources.
    pub preferred_date_order: DateOrder,
    /// Handling of pages without a title.
    pub title_policy: TitlePolicy,
    /// Number of extraction workers (1 to [`MAX_CONCURRENCY`]).
    pub concurrency: usize,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
    /// How many levels of sitemap indexes are expanded.
    pub max_index_depth: u8,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl CrawlConfig {
    /// Defaults for a site: robots.txt discovery, no filters, 10 workers.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            sitemap_urls: None,
            lastmod_min: None,
            path_allow_list: Vec::new(),
            path_ignore_list: Vec::new(),
            ignore_sitemaps: HashSet::new(),
            remove_404: false,
            preferred_date_order: DateOrder::default(),
            title_policy: TitlePolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_index_depth: 1,
            user_agent: concat!("sitemap2posts/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Use an explicit sitemap list instead of robots.txt.
    #[must_use]
    pub fn with_sitemap_urls(mut self, urls: Vec<String>) -> Self {
        self.sitemap_urls = Some(urls);
        self
    }

    /// Set the minimum post date.
    #[must_use]
    pub const fn with_lastmod_min(mut self, lastmod_min: Option<Timestamp>) -> Self {
        self.lastmod_min = lastmod_min;
        self
    }

    /// Set the allow-list patterns.
    #[must_use]
    pub fn with_allow_list(mut self, patterns: Vec<String>) -> Self {
        self.path_allow_list = patterns;
        self
    }

    /// Set the ignore-list patterns.
    #[must_use]
    pub fn with_ignore_list(mut self, patterns: Vec<String>) -> Self {
        self.path_ignore_list = patterns;
        self
    }

    /// Set the sitemaps to skip.
    #[must_use]
    pub fn with_ignore_sitemaps(mut self, sitemaps: impl IntoIterator<Item = String>) -> Self {
        self.ignore_sitemaps = sitemaps.into_iter().collect();
        self
    }

    /// Enable or disable 404 removal.
    #[must_use]
    pub const fn with_remove_404(mut self, remove_404: bool) -> Self {
        self.remove_404 = remove_404;
        self
    }

    /// Set the date source priority.
    #[must_use]
    pub const fn with_date_order(mut self, order: DateOrder) -> Self {
        self.preferred_date_order = order;
        self
    }

    /// Set the missing-title policy.
    #[must_use]
    pub const fn with_title_policy(mut self, policy: TitlePolicy) -> Self {
        self.title_policy = policy;
        self
    }

    /// Set the worker count, clamped to `1..=MAX_CONCURRENCY`.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set how deep sitemap indexes are expanded.
    #[must_use]
    pub const fn with_max_index_depth(mut self, depth: u8) -> Self {
        self.max_index_depth = depth;
        self
    }
}

/// Parse a `YYYY-MM-DD` floor date into midnight UTC.
pub fn parse_lastmod_min(value: &str) -> Result<Timestamp> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .and_then(Timestamp::start_of_day_utc)
        .ok_or_else(|| Error::Config(format!("Invalid lastmod_min format: {value}")))
}

/// How a feed finds its sitemaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Discover sitemaps from the blog's robots.txt.
    #[default]
    Robots,
    /// Use the sitemaps listed after the blog URL in `sitemap_urls`.
    SitemapUrls,
}

/// The feeds file consumed by `sitemap2posts sync`.
///
/// Keys this type does not know about are kept and written back on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Feeds to synchronize.
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    /// Unrecognized top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One feed entry of the feeds file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Remote feed identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_id: Option<String>,
    /// Remote extraction profile identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Blog URL first, then (in `sitemap_urls` mode) the sitemaps.
    #[serde(default)]
    pub sitemap_urls: Vec<String>,
    /// Discovery mode; robots.txt when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FeedMode>,
    /// Minimum post date as `YYYY-MM-DD`. Removed after every sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod_min: Option<String>,
    /// Allow-list glob patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_allow_list: Option<Vec<String>>,
    /// Ignore-list glob patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_ignore_list: Option<Vec<String>>,
    /// Sitemaps to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_sitemaps: Option<Vec<String>>,
    /// Drop pages answering 404.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_404_records: Option<bool>,
    /// Date source priority, e.g. `"LPHM"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date_order: Option<String>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SyncConfig {
    /// Load the feeds file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read configuration file {}: {e}",
                path.display()
            ))
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid JSON in configuration file: {e}")))?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write the feeds file back, pretty-printed with four-space indentation.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        buf.push(b'\n');

        fs::write(path, buf).map_err(|e| {
            Error::Config(format!(
                "Failed to write configuration file {}: {e}",
                path.display()
            ))
        })?;
        tracing::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Check that every feed has the fields a sync needs.
    pub fn validate(&self) -> Result<()> {
        if self.feeds.is_empty() {
            return Err(Error::Config("No feeds found in configuration".into()));
        }

        for (idx, feed) in self.feeds.iter().enumerate() {
            let Some(feed_id) = feed.feed_id.as_deref().filter(|id| !id.is_empty()) else {
                return Err(Error::Config(format!(
                    "Feed at index {idx}: Missing required field 'feed_id'"
                )));
            };
            if feed.sitemap_urls.is_empty() {
                return Err(Error::Config(format!(
                    "Feed {feed_id}: Missing required field 'sitemap_urls'"
                )));
            }
            if feed.profile_id.as_deref().is_none_or(str::is_empty) {
                return Err(Error::Config(format!(
                    "Feed {feed_id}: Missing required field 'profile_id'"
                )));
            }
        }

        tracing::info!(
            "Configuration validated successfully: {} feed(s)",
            self.feeds.len()
        );
        Ok(())
    }

    /// Drop `lastmod_min` from every feed; the floor only applies to one sync.
    pub fn clear_lastmod_min(&mut self) {
        for feed in &mut self.feeds {
            feed.lastmod_min = None;
        }
    }
}

impl FeedConfig {
    /// Feed identifier, or a positional placeholder when missing.
    #[must_use]
    pub fn display_id(&self, idx: usize) -> String {
        self.feed_id
            .clone()
            .unwrap_or_else(|| format!("feed_{idx}"))
    }

    /// Build the crawl configuration for this feed.
    ///
    /// An unparseable `lastmod_min` is logged and ignored rather than
    /// failing the feed.
    pub fn to_crawl_config(&self) -> Result<CrawlConfig> {
        let id = self.feed_id.as_deref().unwrap_or("<unknown>");
        let Some((base_url, rest)) = self.sitemap_urls.split_first() else {
            return Err(Error::Config(format!("Feed {id}: No blog URL provided")));
        };

        let mut config = CrawlConfig::new(base_url.clone());
        if self.mode.unwrap_or_default() == FeedMode::SitemapUrls {
            if rest.is_empty() {
                return Err(Error::Config(format!(
                    "Feed {id}: sitemap_urls mode requires sitemap URLs"
                )));
            }
            config = config.with_sitemap_urls(rest.to_vec());
        }

        if let Some(raw) = self.lastmod_min.as_deref() {
            match parse_lastmod_min(raw) {
                Ok(floor) => {
                    tracing::info!("Filtering posts from {raw}");
                    config = config.with_lastmod_min(Some(floor));
                },
                Err(e) => tracing::error!("{e}"),
            }
        }

        if let Some(order) = self.preferred_date_order.as_deref() {
            config = config.with_date_order(order.parse()?);
        }

        Ok(config
            .with_allow_list(self.path_allow_list.clone().unwrap_or_default())
            .with_ignore_list(self.path_ignore_list.clone().unwrap_or_default())
            .with_ignore_sitemaps(self.ignore_sitemaps.clone().unwrap_or_default())
            .with_remove_404(self.remove_404_records.unwrap_or(false)))
    }
}
