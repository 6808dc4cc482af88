//! Collapsing duplicate URLs listed by several sitemaps.

use crate::types::{DedupedEntry, SitemapEntry};
use std::collections::HashMap;

/// Unique URLs in order of first sighting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupedUrls {
    order: Vec<String>,
    entries: HashMap<String, DedupedEntry>,
}

impl DedupedUrls {
    /// Number of unique URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no URL was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up the retained entry for a URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&DedupedEntry> {
        self.entries.get(url)
    }

    /// Iterate in first-sighting order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DedupedEntry)> {
        self.order
            .iter()
            .filter_map(|url| self.entries.get(url).map(|entry| (url.as_str(), entry)))
    }

    /// Keep only the URLs for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &DedupedEntry) -> bool) {
        let entries = &mut self.entries;
        self.order.retain(|url| {
            let kept = entries.get(url).is_some_and(|entry| keep(url, entry));
            if !kept {
                entries.remove(url);
            }
            kept
        });
    }

    /// Flatten back into entries, in first-sighting order.
    #[must_use]
    pub fn into_entries(mut self) -> Vec<SitemapEntry> {
        self.order
            .into_iter()
            .filter_map(|url| {
                self.entries.remove(&url).map(|entry| SitemapEntry {
                    url,
                    lastmod: entry.lastmod,
                    source_sitemap: entry.source_sitemap,
                })
            })
            .collect()
    }

    fn insert(&mut self, entry: &SitemapEntry) {
        match self.entries.get_mut(&entry.url) {
            None => {
                self.order.push(entry.url.clone());
                self.entries.insert(
                    entry.url.clone(),
                    DedupedEntry {
                        lastmod: entry.lastmod,
                        source_sitemap: entry.source_sitemap.clone(),
                    },
                );
            },
            Some(existing) => {
                let Some(candidate) = entry.lastmod else {
                    return;
                };
                let earlier = existing
                    .lastmod
                    .is_none_or(|current| candidate.is_before(&current));
                if earlier {
                    existing.lastmod = Some(candidate);
                    existing.source_sitemap.clone_from(&entry.source_sitemap);
                }
            },
        }
    }
}

/// Collapse entries sharing a URL.
///
/// The retained entry carries the earliest non-null lastmod together with
/// the sitemap that declared it. On ties, or when no lastmod is known, the
/// first sighting wins. Feeding the result back in changes nothing.
///
/// ```
/// use sitemap2posts_core::discovery::dedupe::dedupe;
/// use sitemap2posts_core::{SitemapEntry, Timestamp};
///
/// let entries = vec![
///     SitemapEntry::new("https://example.com/a", Timestamp::parse("2024-02-01"), "s1.xml"),
///     SitemapEntry::new("https://example.com/a", Timestamp::parse("2024-01-01"), "s2.xml"),
/// ];
/// let deduped = dedupe(&entries);
/// assert_eq!(deduped.len(), 1);
/// assert_eq!(deduped.get("https://example.com/a").unwrap().source_sitemap, "s2.xml");
/// ```
#[must_use]
pub fn dedupe(entries: &[SitemapEntry]) -> DedupedUrls {
    let mut deduped = DedupedUrls::default();
    for entry in entries {
        deduped.insert(entry);
    }
    tracing::info!(
        "Deduplicated {} entries into {} unique URL(s)",
        entries.len(),
        deduped.len()
    );
    deduped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Timestamp;

    fn entry(url: &str, lastmod: Option<&str>, sitemap: &str) -> SitemapEntry {
        SitemapEntry::new(url, lastmod.and_then(Timestamp::parse), sitemap)
    }

    #[test]
    fn test_unique_urls_keep_first_sighting_order() {
        let entries = vec![
            entry("https://x/c", None, "s1"),
            entry("https://x/a", None, "s1"),
            entry("https://x/c", None, "s2"),
            entry("https://x/b", None, "s2"),
        ];
        let deduped = dedupe(&entries);
        let urls: Vec<&str> = deduped.iter().map(|(url, _)| url).collect();
        assert_eq!(urls, vec!["https://x/c", "https://x/a", "https://x/b"]);
    }

    #[test]
    fn test_earliest_lastmod_wins() {
        let entries = vec![
            entry("https://x/a", Some("2024-03-01"), "s1"),
            entry("https://x/a", Some("2024-01-01"), "s2"),
            entry("https://x/a", Some("2024-02-01"), "s3"),
        ];
        let deduped = dedupe(&entries);
        let kept = deduped.get("https://x/a").unwrap();
        assert_eq!(kept.lastmod, Timestamp::parse("2024-01-01"));
        assert_eq!(kept.source_sitemap, "s2");
    }

    #[test]
    fn test_null_never_overwrites_and_is_replaced_by_value() {
        let entries = vec![
            entry("https://x/a", Some("2024-03-01"), "s1"),
            entry("https://x/a", None, "s2"),
            entry("https://x/b", None, "s1"),
            entry("https://x/b", Some("2024-05-01"), "s2"),
        ];
        let deduped = dedupe(&entries);
        assert_eq!(deduped.get("https://x/a").unwrap().source_sitemap, "s1");
        let b = deduped.get("https://x/b").unwrap();
        assert_eq!(b.lastmod, Timestamp::parse("2024-05-01"));
        assert_eq!(b.source_sitemap, "s2");
    }

    #[test]
    fn test_ties_keep_first_sighting() {
        let entries = vec![
            entry("https://x/a", Some("2024-01-01"), "s1"),
            entry("https://x/a", Some("2024-01-01T00:00:00+00:00"), "s2"),
        ];
        assert_eq!(dedupe(&entries).get("https://x/a").unwrap().source_sitemap, "s1");
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let entries = vec![
            entry("https://x/a", Some("2024-03-01"), "s1"),
            entry("https://x/b", None, "s1"),
            entry("https://x/a", Some("2024-01-01"), "s2"),
        ];
        let once = dedupe(&entries);
        let twice = dedupe(&once.clone().into_entries());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_retain_preserves_order() {
        let entries = vec![
            entry("https://x/a", None, "s1"),
            entry("https://x/b", None, "s1"),
            entry("https://x/c", None, "s1"),
        ];
        let mut deduped = dedupe(&entries);
        deduped.retain(|url, _| url != "https://x/b");
        let urls: Vec<&str> = deduped.iter().map(|(url, _)| url).collect();
        assert_eq!(urls, vec!["https://x/a", "https://x/c"]);
        assert!(deduped.get("https://x/b").is_none());
    }
}
