//! Turning one post URL into a [`PostRecord`].
//!
//! Each URL gets exactly one GET request. Failures never propagate: they
//! become a [`Rejection`] that the caller logs and drops.

use crate::article::ArticleMetadata;
use crate::config::{PLACEHOLDER_TITLE, TitlePolicy};
use crate::fetcher::{FetchResponse, Fetcher};
use crate::htmldate::find_date;
use crate::resolve::{DateCandidates, DateOrder, resolve_date};
use crate::types::{DedupedEntry, PostRecord};
use crate::{CrawlConfig, Result, Timestamp};
use scraper::Html;
use std::fmt;

/// Source of page responses.
///
/// Implemented by [`Fetcher`]; tests substitute canned responses.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page. Only transport failures are errors.
    async fn fetch_page(&self, url: &str) -> Result<FetchResponse>;
}

#[async_trait::async_trait]
impl PageFetcher for Fetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchResponse> {
        self.get(url).await
    }
}

/// Why a URL produced no post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The page answered 404 and 404 removal is enabled.
    NotFoundRemoved,
    /// The page answered with a non-2xx status.
    HttpStatus(u16),
    /// The request failed before a response arrived.
    Transport(String),
    /// The page has no title and titles are required.
    MissingTitle,
}

impl Rejection {
    /// Short machine-readable reason.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotFoundRemoved => "not_found_removed",
            Self::HttpStatus(_) => "http_status",
            Self::Transport(_) => "transport",
            Self::MissingTitle => "missing_title",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFoundRemoved => write!(f, "removed (404)"),
            Self::HttpStatus(status) => write!(f, "HTTP {status}"),
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::MissingTitle => write!(f, "no title"),
        }
    }
}

/// Per-run settings shared by every extraction.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Reject 404 pages without parsing them.
    pub remove_404: bool,
    /// Handling of untitled pages.
    pub title_policy: TitlePolicy,
    /// Date source priority.
    pub date_order: DateOrder,
    /// Date given to posts without any candidate date.
    pub fallback: Timestamp,
}

impl ExtractContext {
    /// Build the context of a run from its configuration and fallback date.
    #[must_use]
    pub fn new(config: &CrawlConfig, fallback: Timestamp) -> Self {
        Self {
            remove_404: config.remove_404,
            title_policy: config.title_policy,
            date_order: config.preferred_date_order,
            fallback,
        }
    }
}

/// Fetch one URL and build its post.
pub async fn extract_post<F: PageFetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    entry: &DedupedEntry,
    context: &ExtractContext,
) -> std::result::Result<PostRecord, Rejection> {
    let response = fetcher
        .fetch_page(url)
        .await
        .map_err(|e| Rejection::Transport(e.to_string()))?;
    build_post(url, entry, &response, context)
}

/// Build a post from a response that has already been received.
pub fn build_post(
    url: &str,
    entry: &DedupedEntry,
    response: &FetchResponse,
    context: &ExtractContext,
) -> std::result::Result<PostRecord, Rejection> {
    if response.status == 404 && context.remove_404 {
        return Err(Rejection::NotFoundRemoved);
    }
    if !response.is_success() {
        return Err(Rejection::HttpStatus(response.status));
    }

    let document = Html::parse_document(&response.body);
    let metadata = ArticleMetadata::extract(&document);
    let htmldate = find_date(&document, url);
    let modified_header = response
        .last_modified
        .as_deref()
        .and_then(Timestamp::parse);

    let title = match (metadata.title, context.title_policy) {
        (Some(title), _) => title,
        (None, TitlePolicy::Placeholder) => PLACEHOLDER_TITLE.to_string(),
        (None, TitlePolicy::Require) => return Err(Rejection::MissingTitle),
    };

    let candidates = DateCandidates {
        lastmod: entry.lastmod,
        htmldate,
        publish_date: metadata.publish_date,
        modified_header,
    };
    let resolved_date = resolve_date(&context.date_order, &candidates, context.fallback);

    Ok(PostRecord {
        url: url.to_string(),
        lastmod: entry.lastmod,
        title,
        authors: (!metadata.authors.is_empty()).then(|| metadata.authors.join(", ")),
        tags: (!metadata.tags.is_empty()).then_some(metadata.tags),
        meta_keywords: (!metadata.meta_keywords.is_empty()).then_some(metadata.meta_keywords),
        meta_description: metadata.meta_description,
        publish_date: metadata.publish_date,
        htmldate,
        modified_header,
        resolved_date,
        sitemap: entry.source_sitemap.clone(),
    })
}
