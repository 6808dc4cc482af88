//! Finding the post URLs of a site.
//!
//! Discovery runs sequentially before any page is fetched:
//!
//! 1. [`robots::discover_sitemaps`] reads the `Sitemap:` directives of the
//!    site's robots.txt (skipped when the caller lists sitemaps explicitly)
//! 2. [`sitemap::SitemapTraverser`] expands indexes and collects page URLs,
//!    each tagged with its leaf sitemap
//! 3. [`dedupe::dedupe`] collapses URLs listed more than once
//! 4. [`filter::FilterChain`] applies the base URL, date and glob filters
//!
//! ```no_run
//! use sitemap2posts_core::discovery::{FilterChain, SitemapTraverser, dedupe, discover_sitemaps};
//! use sitemap2posts_core::{CrawlConfig, Fetcher};
//!
//! # async fn example() -> sitemap2posts_core::Result<()> {
//! let config = CrawlConfig::new("https://example.com/blog/");
//! let fetcher = Fetcher::from_config(&config)?;
//!
//! let sitemaps = discover_sitemaps(&fetcher, &config.base_url).await?;
//! let entries = SitemapTraverser::new(&fetcher, &config.ignore_sitemaps, config.max_index_depth)
//!     .traverse(&sitemaps)
//!     .await;
//!
//! let mut urls = dedupe(&entries);
//! FilterChain::from_config(&config)?.apply(&mut urls);
//! println!("{} candidate posts", urls.len());
//! # Ok(())
//! # }
//! ```

pub mod dedupe;
pub mod filter;
pub mod robots;
pub mod sitemap;

pub use dedupe::{DedupedUrls, dedupe};
pub use filter::{FilterChain, GlobPattern};
pub use robots::{discover_sitemaps, parse_robots};
pub use sitemap::{SitemapDocument, SitemapTraverser, SitemapUrl, fetch_and_parse, parse_sitemap};
