//! Sitemap discovery through robots.txt.

use crate::fetcher::Fetcher;
use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, instrument, warn};
use url::Url;

/// Regex for `Sitemap: <url>` directives, case-insensitive, one per line
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static SITEMAP_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*sitemap[ \t]*:[ \t]*(\S+)").unwrap());

/// Extract every `Sitemap:` directive from a robots.txt body, in file order.
///
/// ```
/// use sitemap2posts_core::discovery::robots::parse_robots;
///
/// let body = "User-agent: *\nDisallow: /admin\nSitemap: https://example.com/sitemap.xml\n";
/// assert_eq!(parse_robots(body), vec!["https://example.com/sitemap.xml"]);
/// ```
#[must_use]
pub fn parse_robots(body: &str) -> Vec<String> {
    SITEMAP_DIRECTIVE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Resolve `/robots.txt` against the site root of `base_url`.
pub fn robots_url(base_url: &str) -> Result<String> {
    let base = Url::parse(base_url)
        .map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
    let robots = base
        .join("/robots.txt")
        .map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
    Ok(robots.to_string())
}

/// Fetch robots.txt for a site and return the sitemaps it declares.
///
/// An unreachable robots.txt yields an empty list. Only an unparseable
/// `base_url` is an error.
#[instrument(skip(fetcher))]
pub async fn discover_sitemaps(fetcher: &Fetcher, base_url: &str) -> Result<Vec<String>> {
    let url = robots_url(base_url)?;
    let Some(body) = fetcher.get_document(&url).await else {
        warn!("No robots.txt available at {}", url);
        return Ok(Vec::new());
    };

    let sitemaps = parse_robots(&body);
    info!("Found {} sitemap(s) in {}", sitemaps.len(), url);
    Ok(sitemaps)
}
