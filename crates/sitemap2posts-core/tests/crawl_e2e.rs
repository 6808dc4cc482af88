#![allow(missing_docs, clippy::expect_used, clippy::unwrap_used)]

use sitemap2posts_core::{CrawlConfig, Error, Pipeline, Timestamp, assemble};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn urlset(entries: &[(&str, &str)]) -> String {
    let urls: String = entries
        .iter()
        .map(|(loc, lastmod)| format!("<url><loc>{loc}</loc><lastmod>{lastmod}</lastmod></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{urls}</urlset>"#
    )
}

fn page(title: &str) -> String {
    format!("<html><head><title>{title}</title></head><body><p>{title}</p></body></html>")
}

async fn mount(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// robots.txt -> index -> two leaf sitemaps sharing one post
async fn blog(server: &MockServer) {
    let base = server.uri();
    mount(
        server,
        "/robots.txt",
        format!("User-agent: *\nDisallow: /wp-admin/\nSitemap: {base}/sitemap_index.xml\n"),
    )
    .await;
    mount(
        server,
        "/sitemap_index.xml",
        format!(
            r#"<?xml version="1.0"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><sitemap><loc>{base}/post-sitemap.xml</loc></sitemap><sitemap><loc>{base}/post-sitemap2.xml</loc></sitemap></sitemapindex>"#
        ),
    )
    .await;
    mount(
        server,
        "/post-sitemap.xml",
        urlset(&[
            (&format!("{base}/blog/a"), "2024-03-01T10:00:00+00:00"),
            (&format!("{base}/blog/b"), "2024-02-01T10:00:00+00:00"),
            (&format!("{base}/blog/c"), "2024-01-10T10:00:00+00:00"),
        ]),
    )
    .await;
    mount(
        server,
        "/post-sitemap2.xml",
        urlset(&[
            (&format!("{base}/blog/c"), "2024-01-05T10:00:00+00:00"),
            ("https://elsewhere.example.org/blog/d", "2024-04-01T10:00:00+00:00"),
        ]),
    )
    .await;
    mount(server, "/blog/a", page("Post A")).await;
    mount(server, "/blog/b", page("Post B")).await;
    mount(server, "/blog/c", page("Post C")).await;
}

fn fallback() -> Timestamp {
    Timestamp::parse("2030-01-01T00:00:00+00:00").unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn crawl_from_robots_dedupes_filters_and_sorts() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    blog(&server).await;
    let base = server.uri();

    let config = CrawlConfig::new(format!("{base}/blog/"));
    let posts = Pipeline::new(config)?.run(fallback()).await?;

    let urls: Vec<&str> = posts.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{base}/blog/c"),
            format!("{base}/blog/a"),
            format!("{base}/blog/b"),
        ]
    );

    // The earliest lastmod wins the duplicate, along with its sitemap
    let c = &posts[0];
    assert_eq!(c.sitemap, format!("{base}/post-sitemap2.xml"));
    assert_eq!(c.resolved_date.to_iso8601(), "2024-01-05T10:00:00+00:00");
    assert_eq!(c.title, "Post C");

    let payloads = assemble::to_payloads(&posts);
    assert_eq!(payloads[1].title, "Post A");
    assert_eq!(payloads[1].pubdate, "2024-03-01T10:00:00+00:00");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn crawl_applies_lastmod_floor_and_ignore_globs() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    blog(&server).await;
    let base = server.uri();

    let config = CrawlConfig::new(format!("{base}/blog/"))
        .with_lastmod_min(Timestamp::parse("2024-01-15T00:00:00+00:00"))
        .with_ignore_list(vec!["*/b".to_string()]);
    let posts = Pipeline::new(config)?.run(fallback()).await?;

    let urls: Vec<&str> = posts.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec![format!("{base}/blog/a")]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn explicit_sitemaps_skip_robots() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    blog(&server).await;
    let base = server.uri();

    let config = CrawlConfig::new(format!("{base}/blog/"))
        .with_sitemap_urls(vec![format!("{base}/post-sitemap2.xml")]);
    let posts = Pipeline::new(config)?.run(fallback()).await?;

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url, format!("{base}/blog/c"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn robots_without_sitemaps_is_fatal() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount(&server, "/robots.txt", "User-agent: *\nDisallow:\n".to_string()).await;

    let config = CrawlConfig::new(format!("{}/blog/", server.uri()));
    let err = Pipeline::new(config)?.run(fallback()).await.unwrap_err();
    assert!(matches!(err, Error::NothingToCrawl(_)));
    Ok(())
}
