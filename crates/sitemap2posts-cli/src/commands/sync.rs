//! Sync command implementation

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use sitemap2posts_core::{FeedConfig, Pipeline, SyncConfig, Timestamp, assemble};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::cli::SyncArgs;
use crate::obstracts::{ApiClient, ApiPost};
use crate::summary::{FeedOutcome, FeedStatus, GitHubActions, SyncReport, error_section};

/// Execute the sync command
///
/// Returns a failing exit code when the configuration or credentials are
/// unusable, or when any feed failed.
pub async fn execute(args: SyncArgs) -> Result<ExitCode> {
    let actions = GitHubActions::from_env();

    let mut config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            actions.write_summary(&error_section("Configuration Error", &e.to_string()));
            return Ok(ExitCode::FAILURE);
        },
    };

    let (Some(base_url), Some(api_key)) = (
        args.api_base_url.as_deref().filter(|s| !s.is_empty()),
        args.api_key.as_deref().filter(|s| !s.is_empty()),
    ) else {
        let msg = "Missing required environment variables: \
                   OBSTRACTS_API_BASE_URL and/or OBSTRACTS_API_KEY";
        error!("{}", msg);
        actions.write_summary(&error_section("Error", msg));
        return Ok(ExitCode::FAILURE);
    };

    info!("Using Obstracts API: {}", base_url);
    let client = match ApiClient::new(base_url, api_key) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            actions.write_summary(&error_section("Error", &e.to_string()));
            return Ok(ExitCode::FAILURE);
        },
    };

    info!("Processing {} feed(s)", config.feeds.len());
    let started_at = Utc::now();
    let mut report = SyncReport::new(started_at);
    for (idx, feed) in config.feeds.iter().enumerate() {
        let outcome = process_feed(feed, idx, &client, started_at.into()).await;
        print_outcome(&outcome);
        report.push(outcome);
    }

    // The date floor only applies to this run
    config.clear_lastmod_min();
    if let Err(e) = config.save(&args.config) {
        error!("Failed to save configuration: {}", e);
    }

    actions.set_outputs(&report.outputs());
    actions.write_summary(&report.to_markdown());

    info!("Sync complete");
    info!("Total posts submitted: {}", report.total_posts());
    info!(
        "Successful feeds: {}/{}",
        report.successful_feeds(),
        report.total_feeds()
    );
    info!("Failed feeds: {}/{}", report.failed_feeds(), report.total_feeds());

    if report.failed_feeds() > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn load_config(path: &Path) -> sitemap2posts_core::Result<SyncConfig> {
    let config = SyncConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Crawl one feed and submit its posts.
async fn process_feed(
    feed: &FeedConfig,
    idx: usize,
    client: &ApiClient,
    fallback: Timestamp,
) -> FeedOutcome {
    let feed_id = feed.display_id(idx);
    let profile_id = feed.profile_id.as_deref().unwrap_or_default();
    info!("Processing feed: {}", feed_id);

    let crawl = match feed.to_crawl_config() {
        Ok(crawl) => crawl,
        Err(e) => return FeedOutcome::failed(feed_id, e.to_string()),
    };
    info!(
        "Mode: {}, Sitemap URLs: {}",
        if crawl.sitemap_urls.is_some() { "sitemap_urls" } else { "robots" },
        feed.sitemap_urls.len()
    );

    let posts = match Pipeline::new(crawl) {
        Ok(pipeline) => pipeline.run(fallback).await,
        Err(e) => Err(e),
    };
    let posts = match posts {
        Ok(posts) => posts,
        Err(e) => {
            error!("Feed {}: {}", feed_id, e);
            return FeedOutcome::failed(feed_id, e.to_string());
        },
    };

    if posts.is_empty() {
        warn!("Feed {}: No posts found", feed_id);
        return FeedOutcome::submitted(feed_id, 0, None);
    }
    info!("Found {} posts for feed {}", posts.len(), feed_id);

    let api_posts: Vec<ApiPost> = assemble::to_payloads(&posts)
        .iter()
        .map(ApiPost::from)
        .collect();

    match client.submit_posts(&feed_id, profile_id, &api_posts).await {
        Ok(job_id) => FeedOutcome::submitted(feed_id, api_posts.len(), job_id),
        Err(e) => {
            error!("Failed to create posts for feed {}: {}", feed_id, e);
            FeedOutcome::failed(feed_id, format!("Failed to submit job: {e}"))
        },
    }
}

fn print_outcome(outcome: &FeedOutcome) {
    match &outcome.status {
        FeedStatus::Submitted { message, .. } => {
            eprintln!("{} {}: {}", "✓".green(), outcome.feed_id.bold(), message);
        },
        FeedStatus::Failed { error } => {
            eprintln!("{} {}: {}", "✗".red(), outcome.feed_id.bold(), error);
        },
    }
}
