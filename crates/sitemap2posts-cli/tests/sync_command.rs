#![allow(missing_docs, clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{mount_blog, sitemap2posts_cmd};

fn write_config(path: &Path, config: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(config).unwrap()).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_submits_posts_and_reports() -> anyhow::Result<()> {
    let blog = MockServer::start().await;
    mount_blog(&blog).await;
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/obstracts_api/v1/feeds/feed-1/posts/"))
        .and(header("authorization", "Token test-key"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"job": {"id": "job-42"}})))
        .expect(1)
        .mount(&api)
        .await;

    let dir = tempdir()?;
    let config_path = dir.path().join("feeds.json");
    let summary_path = dir.path().join("summary.md");
    let output_path = dir.path().join("output.txt");
    write_config(
        &config_path,
        &json!({
            "feeds": [{
                "feed_id": "feed-1",
                "profile_id": "profile-1",
                "sitemap_urls": [format!("{}/blog/", blog.uri())],
                "lastmod_min": "2024-01-15",
                "note": "kept"
            }]
        }),
    );

    sitemap2posts_cmd()
        .arg("sync")
        .arg(&config_path)
        .env("OBSTRACTS_API_BASE_URL", format!("{}/obstracts_api/", api.uri()))
        .env("OBSTRACTS_API_KEY", "test-key")
        .env("GITHUB_ACTIONS", "true")
        .env("GITHUB_STEP_SUMMARY", &summary_path)
        .env("GITHUB_OUTPUT", &output_path)
        .assert()
        .success();

    let requests = api.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body)?;
    assert_eq!(body["profile_id"], "profile-1");
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["link"], format!("{}/blog/second", blog.uri()));
    assert_eq!(posts[0]["title"], "Second Post");

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
    assert!(saved["feeds"][0].get("lastmod_min").is_none());
    assert_eq!(saved["feeds"][0]["note"], "kept");

    let summary = std::fs::read_to_string(&summary_path)?;
    assert!(summary.contains("## ✅ Feed: `feed-1`"));
    assert!(summary.contains("- **Job ID:** `job-42`"));
    assert_eq!(
        std::fs::read_to_string(&output_path)?,
        "total_posts=1\nsuccessful_feeds=1\nfailed_feeds=0\ntotal_feeds=1\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_failed_submission_exits_nonzero() -> anyhow::Result<()> {
    let blog = MockServer::start().await;
    mount_blog(&blog).await;
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&api)
        .await;

    let dir = tempdir()?;
    let config_path = dir.path().join("feeds.json");
    write_config(
        &config_path,
        &json!({"feeds": [{
            "feed_id": "feed-1",
            "profile_id": "profile-1",
            "sitemap_urls": [format!("{}/blog/", blog.uri())]
        }]}),
    );

    sitemap2posts_cmd()
        .arg("sync")
        .arg(&config_path)
        .args(["--api-base-url", &api.uri(), "--api-key", "k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("feed-1"));
    Ok(())
}

#[test]
fn sync_without_credentials_fails() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("feeds.json");
    write_config(
        &config_path,
        &json!({"feeds": [{
            "feed_id": "feed-1",
            "profile_id": "profile-1",
            "sitemap_urls": ["https://example.com/blog/"]
        }]}),
    );
    let summary_path = dir.path().join("summary.md");

    sitemap2posts_cmd()
        .arg("sync")
        .arg(&config_path)
        .env("GITHUB_ACTIONS", "true")
        .env("GITHUB_STEP_SUMMARY", &summary_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("OBSTRACTS_API_KEY"));

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.starts_with("## ❌ Error"));
}

#[test]
fn sync_invalid_config_fails() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("feeds.json");
    write_config(&config_path, &json!({"feeds": [{"feed_id": "feed-1"}]}));

    sitemap2posts_cmd()
        .arg("sync")
        .arg(&config_path)
        .env("OBSTRACTS_API_BASE_URL", "https://api.example.com")
        .env("OBSTRACTS_API_KEY", "k")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required field 'sitemap_urls'"));
}
