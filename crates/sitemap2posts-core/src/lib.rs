//! # sitemap2posts-core
//!
//! Core functionality for sitemap2posts - turning a blog's sitemaps into a
//! dated, ordered list of posts.
//!
//! ## Architecture
//!
//! A crawl runs as a pipeline:
//!
//! - **Discovery**: robots.txt and sitemap traversal, deduplication and URL filters ([`discovery`])
//! - **Extraction**: one concurrent GET per post URL, metadata from the HTML ([`extractor`], [`article`], [`htmldate`])
//! - **Date resolution**: one authoritative date per post from four candidates ([`resolve`])
//! - **Assembly**: ordering and JSON export ([`assemble`])
//!
//! [`Pipeline`] wires the stages together; [`config`] holds the run settings
//! and the feeds file used for synchronization.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::Utc;
//! use sitemap2posts_core::{CrawlConfig, Pipeline, assemble};
//!
//! # async fn example() -> sitemap2posts_core::Result<()> {
//! let config = CrawlConfig::new("https://example.com/blog/")
//!     .with_lastmod_min(Some(sitemap2posts_core::config::parse_lastmod_min("2024-01-01")?))
//!     .with_remove_404(true);
//!
//! let posts = Pipeline::new(config)?.run(Utc::now().into()).await?;
//! assemble::write_json(&assemble::to_payloads(&posts), None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Failures of single documents (an unreachable sitemap, a page answering
//! 500) are logged and skipped. Only configuration problems and a site
//! without any sitemap surface as [`Error`]:
//!
//! ```no_run
//! use sitemap2posts_core::{CrawlConfig, Error, Pipeline, Timestamp};
//!
//! # async fn example() -> sitemap2posts_core::Result<()> {
//! let pipeline = Pipeline::new(CrawlConfig::new("https://example.com/"))?;
//! match pipeline.run(Timestamp::parse("2024-06-01").unwrap()).await {
//!     Ok(posts) => println!("{} posts", posts.len()),
//!     Err(Error::NothingToCrawl(msg)) => eprintln!("No sitemaps: {msg}"),
//!     Err(e) => eprintln!("{} error: {e}", e.category()),
//! }
//! # Ok(())
//! # }
//! ```

/// Metadata extraction from article markup
pub mod article;
/// Sorting and JSON export of the final post list
pub mod assemble;
/// Crawl settings and the feeds configuration file
pub mod config;
/// Sitemap discovery, deduplication and URL filtering
pub mod discovery;
/// Error types and result aliases
pub mod error;
/// Per-URL fetch and post construction
pub mod extractor;
/// HTTP fetching
pub mod fetcher;
/// Content-derived publication dates
pub mod htmldate;
/// Crawl orchestration and the extraction worker pool
pub mod pipeline;
/// Date source priority and resolution
pub mod resolve;
/// Offset-aware and naive timestamps
pub mod timestamp;
/// Core data types
pub mod types;

// Re-export commonly used types
pub use config::{CrawlConfig, FeedConfig, FeedMode, SyncConfig, TitlePolicy};
pub use error::{Error, Result};
pub use extractor::{PageFetcher, Rejection};
pub use fetcher::{FetchResponse, Fetcher};
pub use pipeline::{ExtractionPool, Pipeline};
pub use resolve::{DateCandidates, DateOrder, DateSource, resolve_date};
pub use timestamp::Timestamp;
pub use types::*;
