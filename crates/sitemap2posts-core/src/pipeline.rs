//! End-to-end crawl of one site.
//!
//! Coordinates discovery, deduplication, filtering, concurrent extraction
//! and sorting. Only extraction is concurrent: a fixed pool of workers
//! pulls URLs from a shared queue and sends each outcome over a channel to
//! a single collector.
//!
//! ```no_run
//! use chrono::Utc;
//! use sitemap2posts_core::{CrawlConfig, Pipeline};
//!
//! # async fn example() -> sitemap2posts_core::Result<()> {
//! let config = CrawlConfig::new("https://example.com/blog/")
//!     .with_ignore_list(vec!["*/tag/*".to_string()]);
//!
//! let posts = Pipeline::new(config)?.run(Utc::now().into()).await?;
//! for post in &posts {
//!     println!("{} {}", post.resolved_date, post.title);
//! }
//! # Ok(())
//! # }
//! ```

use crate::assemble::sort_posts;
use crate::discovery::{DedupedUrls, FilterChain, SitemapTraverser, dedupe, discover_sitemaps};
use crate::extractor::{ExtractContext, PageFetcher, Rejection, extract_post};
use crate::fetcher::Fetcher;
use crate::types::{DedupedEntry, PostRecord};
use crate::{CrawlConfig, Error, Result, Timestamp};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Progress callback type: `(completed, total)` after each URL.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// A URL that produced no post, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedUrl {
    /// The URL.
    pub url: String,
    /// Why it was dropped.
    pub rejection: Rejection,
}

/// Everything the worker pool produced, keyed by URL.
#[derive(Debug, Default)]
pub struct ExtractionResults {
    /// Posts by URL.
    pub posts: HashMap<String, PostRecord>,
    /// Rejected URLs in completion order.
    pub rejected: Vec<RejectedUrl>,
}

/// Fixed-size pool of extraction workers.
pub struct ExtractionPool<F: PageFetcher + 'static> {
    fetcher: Arc<F>,
    workers: usize,
    progress: Option<ProgressCallback>,
}

impl<F: PageFetcher + 'static> ExtractionPool<F> {
    /// Create a pool of `workers` tasks (clamped to at least one).
    #[must_use]
    pub fn new(fetcher: Arc<F>, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
            progress: None,
        }
    }

    /// Set progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Extract every URL and collect the outcomes.
    ///
    /// The result does not depend on completion order: posts are keyed by URL.
    pub async fn run(&self, urls: &DedupedUrls, context: ExtractContext) -> ExtractionResults {
        let total = urls.len();
        if total == 0 {
            return ExtractionResults::default();
        }

        let queue: VecDeque<(String, DedupedEntry)> = urls
            .iter()
            .map(|(url, entry)| (url.to_string(), entry.clone()))
            .collect();
        let queue = Arc::new(Mutex::new(queue));
        let context = Arc::new(context);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let worker_count = self.workers.min(total);
        debug!("Starting {} extraction worker(s) for {} URL(s)", worker_count, total);

        let mut workers = JoinSet::new();
        for _ in 0..worker_count {
            let queue = Arc::clone(&queue);
            let context = Arc::clone(&context);
            let fetcher = Arc::clone(&self.fetcher);
            let tx = tx.clone();

            workers.spawn(async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some((url, entry)) = next else {
                        break;
                    };
                    let outcome = extract_post(fetcher.as_ref(), &url, &entry, &context).await;
                    if tx.send((url, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        // The channel closes once every worker has dropped its sender
        drop(tx);

        let mut results = ExtractionResults::default();
        let mut completed = 0;
        while let Some((url, outcome)) = rx.recv().await {
            completed += 1;
            match outcome {
                Ok(post) => {
                    debug!("Extracted {}", url);
                    results.posts.insert(url, post);
                },
                Err(rejection) => {
                    warn!("Skipping {}: {}", url, rejection);
                    results.rejected.push(RejectedUrl { url, rejection });
                },
            }
            if let Some(cb) = &self.progress {
                cb(completed, total);
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!("Extraction worker failed: {}", e);
            }
        }

        info!(
            "Extracted {} post(s), rejected {} URL(s)",
            results.posts.len(),
            results.rejected.len()
        );
        results
    }
}

/// One crawl run over a site.
pub struct Pipeline {
    config: CrawlConfig,
    fetcher: Arc<Fetcher>,
    progress: Option<ProgressCallback>,
}

impl Pipeline {
    /// Create a pipeline with an HTTP client built from `config`.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let fetcher = Fetcher::from_config(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create a pipeline around an existing HTTP client.
    #[must_use]
    pub fn with_fetcher(config: CrawlConfig, fetcher: Fetcher) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            progress: None,
        }
    }

    /// Set progress callback for the extraction stage.
    #[must_use]
    pub fn with_progress<C>(mut self, callback: C) -> Self
    where
        C: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Run the crawl.
    ///
    /// `fallback` is the date given to posts without any candidate date;
    /// callers capture it once (typically "now") so that every undated post
    /// of the run shares it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPattern`] when a glob does not compile
    /// - [`Error::InvalidUrl`] when the base URL cannot be parsed for robots.txt lookup
    /// - [`Error::NothingToCrawl`] when no sitemap list was given and robots.txt declares none
    pub async fn run(&self, fallback: Timestamp) -> Result<Vec<PostRecord>> {
        let filters = FilterChain::from_config(&self.config)?;
        let sitemaps = self.sitemaps().await?;

        let entries = SitemapTraverser::new(
            &self.fetcher,
            &self.config.ignore_sitemaps,
            self.config.max_index_depth,
        )
        .traverse(&sitemaps)
        .await;

        let mut urls = dedupe(&entries);
        filters.apply(&mut urls);

        let mut pool = ExtractionPool::new(Arc::clone(&self.fetcher), self.config.concurrency);
        if let Some(cb) = &self.progress {
            pool = pool.with_progress(Arc::clone(cb));
        }
        let results = pool
            .run(&urls, ExtractContext::new(&self.config, fallback))
            .await;

        let posts = self.collect_posts(&urls, results);
        Ok(sort_posts(posts))
    }

    async fn sitemaps(&self) -> Result<Vec<String>> {
        if let Some(explicit) = &self.config.sitemap_urls {
            info!("Using {} configured sitemap(s)", explicit.len());
            return Ok(explicit.clone());
        }

        let discovered = discover_sitemaps(&self.fetcher, &self.config.base_url).await?;
        if discovered.is_empty() {
            return Err(Error::NothingToCrawl(format!(
                "no sitemaps declared in robots.txt for {}",
                self.config.base_url
            )));
        }
        Ok(discovered)
    }

    /// Posts in discovery order, minus undated posts resolved before `lastmod_min`.
    fn collect_posts(&self, urls: &DedupedUrls, mut results: ExtractionResults) -> Vec<PostRecord> {
        let posts: Vec<PostRecord> = urls
            .iter()
            .filter_map(|(url, _)| results.posts.remove(url))
            .collect();

        let Some(min) = &self.config.lastmod_min else {
            return posts;
        };

        let before = posts.len();
        let posts: Vec<PostRecord> = posts
            .into_iter()
            .filter(|post| post.lastmod.is_some() || !post.resolved_date.is_before(min))
            .collect();
        let removed = before - posts.len();
        if removed > 0 {
            info!("Removed {} undated post(s) resolved before {}", removed, min);
        }
        posts
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::fetcher::FetchResponse;
    use crate::types::SitemapEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves a fixed page per URL; later URLs answer faster so completion
    /// order is the reverse of submission order.
    struct MockPages {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        total: usize,
    }

    impl MockPages {
        fn new(total: usize) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                total,
            }
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for MockPages {
        async fn fetch_page(&self, url: &str) -> Result<FetchResponse> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let idx: usize = url.rsplit('/').next().unwrap().parse().unwrap();
            let delay = (self.total - idx) as u64 * 5;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if idx % 5 == 0 {
                return Ok(FetchResponse {
                    status: 500,
                    body: String::new(),
                    last_modified: None,
                });
            }
            Ok(FetchResponse {
                status: 200,
                body: format!("<html><head><title>Post {idx}</title></head></html>"),
                last_modified: None,
            })
        }
    }

    fn urls(count: usize) -> DedupedUrls {
        let entries: Vec<SitemapEntry> = (1..=count)
            .map(|i| SitemapEntry::new(format!("https://example.com/{i}"), None, "s.xml"))
            .collect();
        dedupe(&entries)
    }

    fn context() -> ExtractContext {
        ExtractContext::new(
            &CrawlConfig::new("https://example.com/"),
            Timestamp::parse("2030-01-01T00:00:00Z").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_pool_collects_every_outcome() {
        let pages = Arc::new(MockPages::new(20));
        let pool = ExtractionPool::new(Arc::clone(&pages), 4);
        let results = pool.run(&urls(20), context()).await;

        assert_eq!(results.posts.len(), 16);
        assert_eq!(results.rejected.len(), 4);
        assert!(
            results
                .rejected
                .iter()
                .all(|r| r.rejection == Rejection::HttpStatus(500))
        );
        assert_eq!(results.posts["https://example.com/7"].title, "Post 7");
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let pages = Arc::new(MockPages::new(12));
        let pool = ExtractionPool::new(Arc::clone(&pages), 3);
        pool.run(&urls(12), context()).await;

        let max = pages.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "max in flight was {max}");
        assert!(max >= 2, "expected parallelism, max in flight was {max}");
    }

    #[tokio::test]
    async fn test_results_independent_of_worker_count() {
        let list = urls(9);
        let serial = ExtractionPool::new(Arc::new(MockPages::new(9)), 1)
            .run(&list, context())
            .await;
        let parallel = ExtractionPool::new(Arc::new(MockPages::new(9)), 9)
            .run(&list, context())
            .await;

        assert_eq!(serial.posts, parallel.posts);
    }

    #[tokio::test]
    async fn test_progress_reports_each_url() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let calls_clone = Arc::clone(&calls);
        let pool = ExtractionPool::new(Arc::new(MockPages::new(3)), 2).with_progress(Arc::new(
            move |done, total| {
                calls_clone.lock().expect("lock").push((done, total));
            },
        ));
        pool.run(&urls(3), context()).await;

        let calls = calls.lock().expect("lock");
        assert_eq!(*calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let pool = ExtractionPool::new(Arc::new(MockPages::new(0)), 4);
        let results = pool.run(&DedupedUrls::default(), context()).await;
        assert!(results.posts.is_empty());
        assert!(results.rejected.is_empty());
    }

    #[test]
    fn test_deferred_date_filter_only_touches_undated_posts() {
        let config = CrawlConfig::new("https://x/")
            .with_lastmod_min(crate::config::parse_lastmod_min("2024-01-01").ok());
        let pipeline = Pipeline::new(config).unwrap();

        let post = |url: &str, lastmod: Option<&str>, resolved: &str| PostRecord {
            url: url.to_string(),
            lastmod: lastmod.and_then(Timestamp::parse),
            title: "t".to_string(),
            authors: None,
            tags: None,
            meta_keywords: None,
            meta_description: None,
            publish_date: None,
            htmldate: None,
            modified_header: None,
            resolved_date: Timestamp::parse(resolved).unwrap(),
            sitemap: "s.xml".to_string(),
        };

        let entries = vec![
            SitemapEntry::new("https://x/dated", Timestamp::parse("2024-02-01"), "s.xml"),
            SitemapEntry::new("https://x/old", None, "s.xml"),
            SitemapEntry::new("https://x/new", None, "s.xml"),
        ];
        let list = dedupe(&entries);

        let mut results = ExtractionResults::default();
        // resolved via publish date, older than the floor, but lastmod was present
        results.posts.insert(
            "https://x/dated".to_string(),
            post("https://x/dated", Some("2024-02-01"), "2023-06-01"),
        );
        results
            .posts
            .insert("https://x/old".to_string(), post("https://x/old", None, "2023-12-31"));
        results
            .posts
            .insert("https://x/new".to_string(), post("https://x/new", None, "2024-01-01"));

        let urls: Vec<String> = pipeline
            .collect_posts(&list, results)
            .into_iter()
            .map(|p| p.url)
            .collect();
        assert_eq!(urls, vec!["https://x/dated", "https://x/new"]);
    }
}
