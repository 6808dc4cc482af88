//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Crawl a blog through its robots.txt and print the posts as JSON
//! sitemap2posts crawl https://example.com/blog/
//!
//! # Explicit sitemaps, a date floor and glob filters, written to a file
//! sitemap2posts crawl https://example.com/blog/ \
//!     --sitemap https://example.com/post-sitemap.xml \
//!     --lastmod-min 2024-01-01 --ignore '*/tag/*' --output posts.json
//!
//! # Submit every feed of a feeds file to the Obstracts API
//! OBSTRACTS_API_BASE_URL=https://api.example.com OBSTRACTS_API_KEY=... \
//!     sitemap2posts sync feeds.json
//! ```
//!
//! Logs go to stderr so stdout only ever carries JSON.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for the `sitemap2posts` command
#[derive(Parser, Clone, Debug)]
#[command(name = "sitemap2posts")]
#[command(version)]
#[command(about = "Turn a blog's sitemaps into a dated list of posts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Crawl one site and write its posts as JSON
    Crawl(CrawlArgs),

    /// Crawl every feed of a feeds file and submit the posts to the Obstracts API
    Sync(SyncArgs),
}

#[derive(Args, Clone, Debug)]
pub struct CrawlArgs {
    /// Blog URL; post URLs must start with it
    pub base_url: String,

    /// Sitemap to read instead of robots.txt (repeatable)
    #[arg(long = "sitemap", value_name = "URL")]
    pub sitemaps: Vec<String>,

    /// Drop posts last modified before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub lastmod_min: Option<String>,

    /// Only keep URLs matching this glob (repeatable)
    #[arg(long = "allow", value_name = "GLOB")]
    pub allow: Vec<String>,

    /// Drop URLs matching this glob (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Never fetch this sitemap (repeatable)
    #[arg(long = "ignore-sitemap", value_name = "URL")]
    pub ignore_sitemaps: Vec<String>,

    /// Drop pages answering 404
    #[arg(long)]
    pub remove_404: bool,

    /// Date source priority: permutation of L(astmod), P(ublish date), H(tmldate), M(odified header)
    #[arg(long, value_name = "ORDER", default_value = "LPHM")]
    pub date_order: String,

    /// Drop pages without a title instead of using "No Title"
    #[arg(long)]
    pub require_title: bool,

    /// Number of pages fetched concurrently
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=50))]
    pub concurrency: u16,

    /// Write JSON here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct SyncArgs {
    /// Feeds configuration file (JSON)
    pub config: PathBuf,

    /// Obstracts API base URL
    #[arg(long, env = "OBSTRACTS_API_BASE_URL", value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Obstracts API key
    #[arg(long, env = "OBSTRACTS_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_crawl_defaults() {
        let cli = Cli::try_parse_from(["sitemap2posts", "crawl", "https://example.com/"]).unwrap();
        let Commands::Crawl(args) = cli.command else {
            unreachable!("expected crawl");
        };
        assert_eq!(args.base_url, "https://example.com/");
        assert_eq!(args.date_order, "LPHM");
        assert_eq!(args.concurrency, 10);
        assert!(args.sitemaps.is_empty());
        assert!(!args.remove_404);
    }

    #[test]
    fn test_crawl_repeatable_flags() {
        let cli = Cli::try_parse_from([
            "sitemap2posts",
            "-v",
            "crawl",
            "https://example.com/",
            "--sitemap",
            "https://example.com/a.xml",
            "--sitemap",
            "https://example.com/b.xml",
            "--ignore",
            "*/tag/*",
            "--remove-404",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Crawl(args) = cli.command else {
            unreachable!("expected crawl");
        };
        assert_eq!(args.sitemaps.len(), 2);
        assert_eq!(args.ignore, vec!["*/tag/*"]);
        assert!(args.remove_404);
    }

    #[test]
    fn test_concurrency_range() {
        let result = Cli::try_parse_from([
            "sitemap2posts",
            "crawl",
            "https://example.com/",
            "--concurrency",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["sitemap2posts", "-v", "-q", "sync", "feeds.json"]);
        assert!(result.is_err());
    }
}
