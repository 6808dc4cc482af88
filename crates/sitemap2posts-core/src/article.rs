//! Article metadata from HTML markup.
//!
//! Reads the title, authors, tags, keywords, description and declared
//! publication date a blog engine embeds in a page: OpenGraph and
//! `article:*` properties, classic `<meta name>` tags, `rel` links and
//! schema.org `itemprop` attributes.

use crate::Timestamp;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

/// `<meta>` keys that declare the publication date, in priority order.
const PUBLISH_DATE_KEYS: &[&str] = &[
    "article:published_time",
    "og:published_time",
    "pubdate",
    "publishdate",
    "date",
    "dc.date.issued",
    "datepublished",
];

/// SAFETY: Selectors are compile-time constants that are known to be valid.
#[allow(clippy::unwrap_used)]
static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta[content]").unwrap());
#[allow(clippy::unwrap_used)]
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
#[allow(clippy::unwrap_used)]
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
#[allow(clippy::unwrap_used)]
static REL_AUTHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[rel~="author"]"#).unwrap());
#[allow(clippy::unwrap_used)]
static ITEMPROP_AUTHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[itemprop~="author"]:not(meta)"#).unwrap());
#[allow(clippy::unwrap_used)]
static ITEMPROP_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[itemprop~="name"]"#).unwrap());
#[allow(clippy::unwrap_used)]
static REL_TAG: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"a[rel~="tag"]"#).unwrap());
#[allow(clippy::unwrap_used)]
static ITEMPROP_PUBLISHED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[itemprop="datePublished"]:not(meta)"#).unwrap());

/// Metadata read from one article page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMetadata {
    /// Title with whitespace collapsed.
    pub title: Option<String>,
    /// Distinct author names in document order.
    pub authors: Vec<String>,
    /// Distinct tags in document order.
    pub tags: Vec<String>,
    /// Comma-separated keywords, split and trimmed.
    pub meta_keywords: Vec<String>,
    /// Page description.
    pub meta_description: Option<String>,
    /// Publication date declared by the markup.
    pub publish_date: Option<Timestamp>,
}

impl ArticleMetadata {
    /// Extract metadata from a parsed document.
    ///
    /// ```
    /// use scraper::Html;
    /// use sitemap2posts_core::article::ArticleMetadata;
    ///
    /// let html = Html::parse_document(r#"<html><head>
    ///     <title>Hello   world</title>
    ///     <meta name="author" content="Ada Lovelace">
    ///     <meta property="article:published_time" content="2024-01-15T09:00:00Z">
    /// </head></html>"#);
    ///
    /// let meta = ArticleMetadata::extract(&html);
    /// assert_eq!(meta.title.as_deref(), Some("Hello world"));
    /// assert_eq!(meta.authors, vec!["Ada Lovelace"]);
    /// assert!(meta.publish_date.is_some());
    /// ```
    #[must_use]
    pub fn extract(document: &Html) -> Self {
        let metas = MetaTags::collect(document);

        Self {
            title: extract_title(document, &metas),
            authors: extract_authors(document, &metas),
            tags: extract_tags(document, &metas),
            meta_keywords: metas
                .first("keywords")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            meta_description: metas
                .first("description")
                .or_else(|| metas.first("og:description"))
                .map(collapse_whitespace)
                .filter(|d| !d.is_empty()),
            publish_date: extract_publish_date(document, &metas),
        }
    }
}

/// `<meta>` contents keyed by lowercased `name`, `property` or `itemprop`.
pub(crate) struct MetaTags {
    values: HashMap<String, Vec<String>>,
}

impl MetaTags {
    pub(crate) fn collect(document: &Html) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for element in document.select(&META) {
            let attrs = element.value();
            let Some(content) = attrs.attr("content") else {
                continue;
            };
            for key in ["name", "property", "itemprop"]
                .iter()
                .filter_map(|attr| attrs.attr(attr))
            {
                values
                    .entry(key.trim().to_ascii_lowercase())
                    .or_default()
                    .push(content.trim().to_string());
            }
        }
        Self { values }
    }

    /// First non-empty value for `key`.
    pub(crate) fn first(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)?
            .iter()
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }

    /// Every non-empty value for `key`.
    pub(crate) fn all(&self, key: &str) -> impl Iterator<Item = &str> {
        self.values
            .get(key)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn extract_title(document: &Html, metas: &MetaTags) -> Option<String> {
    metas
        .first("og:title")
        .map(collapse_whitespace)
        .or_else(|| document.select(&TITLE).next().map(element_text))
        .filter(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&H1)
                .map(element_text)
                .find(|t| !t.is_empty())
        })
}

fn push_distinct(values: &mut Vec<String>, candidate: &str) {
    let candidate = collapse_whitespace(candidate);
    if candidate.is_empty() || values.iter().any(|v| v.eq_ignore_ascii_case(&candidate)) {
        return;
    }
    values.push(candidate);
}

fn extract_authors(document: &Html, metas: &MetaTags) -> Vec<String> {
    let mut authors = Vec::new();

    // article:author is frequently a profile URL rather than a name
    for value in metas.all("author").chain(metas.all("article:author")) {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            push_distinct(&mut authors, value);
        }
    }
    for element in document.select(&REL_AUTHOR) {
        push_distinct(&mut authors, &element_text(element));
    }
    for element in document.select(&ITEMPROP_AUTHOR) {
        let name = element
            .select(&ITEMPROP_NAME)
            .next()
            .map_or_else(|| element_text(element), |n| {
                n.value()
                    .attr("content")
                    .map_or_else(|| element_text(n), ToString::to_string)
            });
        push_distinct(&mut authors, &name);
    }

    authors
}

fn extract_tags(document: &Html, metas: &MetaTags) -> Vec<String> {
    let mut tags = Vec::new();
    for value in metas.all("article:tag") {
        push_distinct(&mut tags, value);
    }
    for element in document.select(&REL_TAG) {
        push_distinct(&mut tags, &element_text(element));
    }
    tags
}

fn extract_publish_date(document: &Html, metas: &MetaTags) -> Option<Timestamp> {
    PUBLISH_DATE_KEYS
        .iter()
        .filter_map(|key| metas.first(key))
        .find_map(Timestamp::parse)
        .or_else(|| {
            document.select(&ITEMPROP_PUBLISHED).find_map(|element| {
                let attrs = element.value();
                attrs
                    .attr("datetime")
                    .or_else(|| attrs.attr("content"))
                    .and_then(Timestamp::parse)
            })
        })
}
