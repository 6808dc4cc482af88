//! Core data types flowing through the crawl pipeline.

use crate::Timestamp;
use serde::Serialize;

/// A page URL discovered in a sitemap, tagged with the leaf sitemap that listed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapEntry {
    /// The page URL (`<loc>`).
    pub url: String,
    /// The sitemap-declared last modification time (`<lastmod>`).
    pub lastmod: Option<Timestamp>,
    /// URL of the URL-set sitemap this entry came from. Never an index.
    pub source_sitemap: String,
}

impl SitemapEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        lastmod: Option<Timestamp>,
        source_sitemap: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            lastmod,
            source_sitemap: source_sitemap.into(),
        }
    }
}

/// What the deduplicator keeps for each unique URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupedEntry {
    /// Earliest non-null lastmod seen for the URL.
    pub lastmod: Option<Timestamp>,
    /// Sitemap that declared the retained lastmod.
    pub source_sitemap: String,
}

/// Metadata for one blog post, ready for sorting and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    /// Page URL.
    pub url: String,
    /// Sitemap-declared last modification time.
    pub lastmod: Option<Timestamp>,
    /// Article title, or the placeholder when the page had none.
    pub title: String,
    /// Author names joined with `", "`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    /// Article tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Values of `<meta name="keywords">`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<Vec<String>>,
    /// Value of `<meta name="description">`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    /// Publication date declared by article metadata.
    pub publish_date: Option<Timestamp>,
    /// Date inferred from the page content and markup.
    pub htmldate: Option<Timestamp>,
    /// `Last-Modified` response header.
    pub modified_header: Option<Timestamp>,
    /// The authoritative date picked by the date resolver.
    pub resolved_date: Timestamp,
    /// Leaf sitemap that listed the URL.
    pub sitemap: String,
}

impl PostRecord {
    /// Flatten into the record shape downstream consumers expect.
    #[must_use]
    pub fn to_payload(&self) -> PostPayload {
        PostPayload {
            url: self.url.clone(),
            title: self.title.clone(),
            pubdate: self.resolved_date.to_iso8601(),
            author: self.authors.clone(),
            categories: self.tags.clone(),
        }
    }
}

/// Flat post record handed to exporters and the bulk submission API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPayload {
    /// Page URL.
    pub url: String,
    /// Article title.
    pub title: String,
    /// Resolved publication date in ISO 8601.
    pub pubdate: String,
    /// Author names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}
