//! Sitemap XML parsing and traversal.
//!
//! ## Sitemap Formats
//!
//! - **URL set**: `<urlset>` with `<url>` entries (`<loc>` plus optional `<lastmod>`)
//! - **Sitemap index**: `<sitemapindex>` with `<sitemap>` entries pointing to
//!   other sitemaps
//!
//! Namespaces and prefixes are ignored; only local element names matter.
//!
//! ## Traversal
//!
//! [`SitemapTraverser`] walks a list of top-level sitemaps in order. Indexes
//! are expanded into their children up to `max_index_depth` levels, every
//! sitemap is fetched at most once per run, and ignored sitemaps are never
//! fetched. Each page URL is tagged with the URL-set sitemap that listed it.
//!
//! ```
//! use sitemap2posts_core::discovery::sitemap::{SitemapDocument, parse_sitemap};
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/blog/first-post</loc>
//!     <lastmod>2024-01-15</lastmod>
//!   </url>
//! </urlset>"#;
//!
//! match parse_sitemap(xml).unwrap() {
//!     SitemapDocument::UrlSet(urls) => assert_eq!(urls[0].loc, "https://example.com/blog/first-post"),
//!     other => panic!("unexpected document: {other:?}"),
//! }
//! ```

use crate::fetcher::Fetcher;
use crate::types::SitemapEntry;
use crate::{Error, Result, Timestamp};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info, instrument, warn};

/// One `<url>` element of a URL-set sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
    /// Page URL.
    pub loc: String,
    /// Declared last modification time, if present and parseable.
    pub lastmod: Option<Timestamp>,
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps.
    Index(Vec<String>),
    /// `<urlset>`: page URLs.
    UrlSet(Vec<SitemapUrl>),
    /// Well-formed XML with any other root element.
    Unknown,
}

impl SitemapDocument {
    /// Whether the document is a sitemap index.
    #[must_use]
    pub const fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Root {
    Index,
    UrlSet,
    Other,
}

/// Parse sitemap XML, detecting whether it is an index or a URL set.
///
/// Entries without a `<loc>` are skipped; an unparseable `<lastmod>` is
/// treated as absent.
///
/// # Errors
///
/// Returns [`Error::Parse`] when the XML is malformed.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut root: Option<Root> = None;
    let mut index_locs = Vec::new();
    let mut urls = Vec::new();

    // Element nesting depth, and the depth of the open <url> or <sitemap> entry.
    // Only direct children of the entry count, so extension elements such
    // as <image:image><image:loc> never replace the page location.
    let mut depth = 0usize;
    let mut entry_depth: Option<usize> = None;
    let mut current_element: Option<String> = None;
    let mut current_loc: Option<String> = None;
    let mut current_lastmod: Option<Timestamp> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match (root, name.as_str(), entry_depth) {
                    (None, "sitemapindex", _) => root = Some(Root::Index),
                    (None, "urlset", _) => root = Some(Root::UrlSet),
                    (None, _, _) => root = Some(Root::Other),
                    (Some(Root::Index), "sitemap", None) | (Some(Root::UrlSet), "url", None) => {
                        entry_depth = Some(depth);
                        current_loc = None;
                        current_lastmod = None;
                    },
                    (Some(_), "loc" | "lastmod", Some(entry)) if depth == entry + 1 => {
                        current_element = Some(name);
                    },
                    _ => {},
                }
            },
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                let closes_entry = entry_depth == Some(depth);
                match (root, name.as_str()) {
                    (Some(Root::Index), "sitemap") if closes_entry => {
                        if let Some(loc) = current_loc.take() {
                            index_locs.push(loc);
                        }
                        entry_depth = None;
                    },
                    (Some(Root::UrlSet), "url") if closes_entry => {
                        if let Some(loc) = current_loc.take() {
                            urls.push(SitemapUrl {
                                loc,
                                lastmod: current_lastmod.take(),
                            });
                        }
                        entry_depth = None;
                    },
                    _ => {},
                }
                depth = depth.saturating_sub(1);
                current_element = None;
            },
            Ok(Event::Text(e)) => {
                if let Some(ref element) = current_element {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    apply_text(element, text.trim(), &mut current_loc, &mut current_lastmod);
                }
            },
            Ok(Event::CData(e)) => {
                if let Some(ref element) = current_element {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    apply_text(element, text.trim(), &mut current_loc, &mut current_lastmod);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("XML parse error: {e}"))),
            _ => {},
        }
        buf.clear();
    }

    Ok(match root {
        Some(Root::Index) => SitemapDocument::Index(index_locs),
        Some(Root::UrlSet) => SitemapDocument::UrlSet(urls),
        _ => SitemapDocument::Unknown,
    })
}

fn apply_text(
    element: &str,
    text: &str,
    loc: &mut Option<String>,
    lastmod: &mut Option<Timestamp>,
) {
    match element {
        "loc" if !text.is_empty() => *loc = Some(text.to_string()),
        "lastmod" => *lastmod = Timestamp::parse(text),
        _ => {},
    }
}

/// Fetch and parse one sitemap.
///
/// Transport failures, error statuses, malformed XML and unknown root
/// elements all yield an empty URL set and a warning.
#[instrument(skip(fetcher))]
pub async fn fetch_and_parse(fetcher: &Fetcher, url: &str) -> SitemapDocument {
    let Some(xml) = fetcher.get_document(url).await else {
        return SitemapDocument::UrlSet(Vec::new());
    };

    match parse_sitemap(&xml) {
        Ok(SitemapDocument::Unknown) => {
            warn!("{} is neither a sitemap index nor a URL set", url);
            SitemapDocument::UrlSet(Vec::new())
        },
        Ok(document) => document,
        Err(e) => {
            warn!("Failed to parse sitemap {}: {}", url, e);
            SitemapDocument::UrlSet(Vec::new())
        },
    }
}

type VisitFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Walks sitemap hierarchies for one crawl run.
pub struct SitemapTraverser<'a> {
    fetcher: &'a Fetcher,
    ignore: &'a HashSet<String>,
    max_index_depth: u8,
    visited: HashSet<String>,
}

impl<'a> SitemapTraverser<'a> {
    /// Create a traverser that skips `ignore` and expands at most
    /// `max_index_depth` levels of indexes.
    #[must_use]
    pub fn new(fetcher: &'a Fetcher, ignore: &'a HashSet<String>, max_index_depth: u8) -> Self {
        Self {
            fetcher,
            ignore,
            max_index_depth,
            visited: HashSet::new(),
        }
    }

    /// Collect the page URLs reachable from `sitemaps`, in document order.
    pub async fn traverse(&mut self, sitemaps: &[String]) -> Vec<SitemapEntry> {
        let mut entries = Vec::new();
        for sitemap in sitemaps {
            self.visit(sitemap.clone(), 0, &mut entries).await;
        }
        info!(
            "Collected {} URL(s) from {} sitemap(s)",
            entries.len(),
            self.visited.len()
        );
        entries
    }

    fn visit<'s>(
        &'s mut self,
        url: String,
        depth: u8,
        out: &'s mut Vec<SitemapEntry>,
    ) -> VisitFuture<'s> {
        Box::pin(async move {
            if self.ignore.contains(&url) {
                info!("Skipping ignored sitemap {}", url);
                return;
            }
            if !self.visited.insert(url.clone()) {
                debug!("Sitemap {} already visited", url);
                return;
            }

            debug!(url = %url, depth = depth, "Fetching sitemap");
            match fetch_and_parse(self.fetcher, &url).await {
                SitemapDocument::Index(children) if depth < self.max_index_depth => {
                    debug!("Sitemap index {} lists {} child sitemap(s)", url, children.len());
                    for child in children {
                        self.visit(child, depth + 1, out).await;
                    }
                },
                SitemapDocument::Index(children) => {
                    warn!(
                        "Not expanding nested sitemap index {} ({} children): depth limit {} reached",
                        url,
                        children.len(),
                        self.max_index_depth
                    );
                },
                SitemapDocument::UrlSet(urls) => {
                    debug!("Sitemap {} lists {} URL(s)", url, urls.len());
                    out.extend(
                        urls.into_iter()
                            .map(|u| SitemapEntry::new(u.loc, u.lastmod, url.clone())),
                    );
                },
                SitemapDocument::Unknown => {},
            }
        })
    }
}
