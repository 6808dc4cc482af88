#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a configured `sitemap2posts` command suitable for integration tests.
///
/// GitHub Actions variables are cleared so a CI host does not leak into the run.
#[allow(dead_code)]
pub fn sitemap2posts_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitemap2posts"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("GITHUB_ACTIONS");
    cmd.env_remove("GITHUB_STEP_SUMMARY");
    cmd.env_remove("GITHUB_OUTPUT");
    cmd.env_remove("OBSTRACTS_API_BASE_URL");
    cmd.env_remove("OBSTRACTS_API_KEY");
    cmd
}

#[allow(dead_code)]
pub async fn mount_get(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// A blog under `/blog/` with robots.txt, one sitemap and two posts.
#[allow(dead_code)]
pub async fn mount_blog(server: &MockServer) {
    let base = server.uri();
    mount_get(server, "/robots.txt", format!("Sitemap: {base}/post-sitemap.xml\n")).await;
    mount_get(
        server,
        "/post-sitemap.xml",
        format!(
            r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><url><loc>{base}/blog/first</loc><lastmod>2024-01-01T08:00:00+00:00</lastmod></url><url><loc>{base}/blog/second</loc><lastmod>2024-02-01T08:00:00+00:00</lastmod></url><url><loc>{base}/about/</loc><lastmod>2024-03-01T08:00:00+00:00</lastmod></url></urlset>"#
        ),
    )
    .await;
    for (slug, title) in [("first", "First Post"), ("second", "Second Post")] {
        mount_get(
            server,
            &format!("/blog/{slug}"),
            format!(
                r#"<html><head><title>{title}</title><meta name="author" content="Ann Writer"></head><body></body></html>"#
            ),
        )
        .await;
    }
}
