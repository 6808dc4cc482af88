//! Crawl command implementation

use anyhow::{Context, Result};
use chrono::Utc;
use sitemap2posts_core::config::parse_lastmod_min;
use sitemap2posts_core::{CrawlConfig, DateOrder, Pipeline, TitlePolicy, assemble};
use tracing::info;

use crate::cli::CrawlArgs;
use crate::progress;

/// Build the crawl configuration from command-line flags
pub fn build_config(args: &CrawlArgs) -> Result<CrawlConfig> {
    let date_order: DateOrder = args.date_order.parse()?;
    let lastmod_min = args
        .lastmod_min
        .as_deref()
        .map(parse_lastmod_min)
        .transpose()?;

    let mut config = CrawlConfig::new(args.base_url.clone())
        .with_lastmod_min(lastmod_min)
        .with_allow_list(args.allow.clone())
        .with_ignore_list(args.ignore.clone())
        .with_ignore_sitemaps(args.ignore_sitemaps.clone())
        .with_remove_404(args.remove_404)
        .with_date_order(date_order)
        .with_concurrency(usize::from(args.concurrency));

    if !args.sitemaps.is_empty() {
        config = config.with_sitemap_urls(args.sitemaps.clone());
    }
    if args.require_title {
        config = config.with_title_policy(TitlePolicy::Require);
    }
    Ok(config)
}

/// Execute the crawl command
pub async fn execute(args: CrawlArgs, quiet: bool) -> Result<()> {
    let config = build_config(&args)?;
    let base_url = config.base_url.clone();

    let pb = progress::extraction_bar(quiet);
    let pipeline = Pipeline::new(config)?.with_progress(progress::callback(&pb));

    let posts = pipeline
        .run(Utc::now().into())
        .await
        .with_context(|| format!("Failed to crawl {base_url}"))?;
    pb.finish_and_clear();

    info!("Found {} post(s) under {}", posts.len(), base_url);

    let payloads = assemble::to_payloads(&posts);
    assemble::write_json(&payloads, args.output.as_deref()).with_context(|| match &args.output {
        Some(path) => format!("Failed to write {}", path.display()),
        None => "Failed to write to stdout".to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn args(extra: &[&str]) -> CrawlArgs {
        let mut argv = vec!["sitemap2posts", "crawl", "https://example.com/blog/"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Crawl(args) => args,
            Commands::Sync(_) => unreachable!("expected crawl"),
        }
    }

    #[test]
    fn test_defaults_use_robots() {
        let config = build_config(&args(&[])).unwrap();
        assert!(config.sitemap_urls.is_none());
        assert_eq!(config.title_policy, TitlePolicy::Placeholder);
        assert_eq!(config.concurrency, 10);
    }

    #[test]
    fn test_flags_map_onto_config() {
        let config = build_config(&args(&[
            "--sitemap",
            "https://example.com/post-sitemap.xml",
            "--lastmod-min",
            "2024-02-01",
            "--date-order",
            "phlm",
            "--require-title",
            "--concurrency",
            "3",
        ]))
        .unwrap();
        assert_eq!(
            config.sitemap_urls.unwrap(),
            vec!["https://example.com/post-sitemap.xml"]
        );
        assert_eq!(config.lastmod_min.unwrap().to_iso8601(), "2024-02-01T00:00:00+00:00");
        assert_eq!(config.preferred_date_order.to_string(), "PHLM");
        assert_eq!(config.title_policy, TitlePolicy::Require);
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn test_invalid_flags_are_errors() {
        assert!(build_config(&args(&["--date-order", "LPH"])).is_err());
        assert!(build_config(&args(&["--lastmod-min", "yesterday"])).is_err());
    }
}
