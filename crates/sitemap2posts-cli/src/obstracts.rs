//! Client for the Obstracts feed API

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use sitemap2posts_core::{Error, PostPayload, Result};
use std::time::Duration;
use tracing::{debug, info, instrument};

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(120);

/// One post as the bulk endpoint expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiPost {
    pub link: String,
    pub title: String,
    pub pubdate: String,
}

impl From<&PostPayload> for ApiPost {
    fn from(payload: &PostPayload) -> Self {
        Self {
            link: payload.url.clone(),
            title: payload.title.clone(),
            pubdate: payload.pubdate.clone(),
        }
    }
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    posts: &'a [ApiPost],
    profile_id: &'a str,
}

/// Authenticated client for one API deployment
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Build a client sending `Authorization: Token <api_key>` on every request.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Token {api_key}"))
            .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?;
        headers.insert(AUTHORIZATION, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(SUBMIT_TIMEOUT)
            .user_agent(concat!("sitemap2posts/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn posts_endpoint(&self, feed_id: &str) -> String {
        format!("{}/v1/feeds/{feed_id}/posts/", self.base_url)
    }

    /// Submit all posts of a feed as one bulk job.
    ///
    /// Returns the job id when the response carries one.
    #[instrument(skip(self, posts), fields(count = posts.len()))]
    pub async fn submit_posts(
        &self,
        feed_id: &str,
        profile_id: &str,
        posts: &[ApiPost],
    ) -> Result<Option<String>> {
        info!(
            "Submitting bulk post creation job for feed {} with {} posts",
            feed_id,
            posts.len()
        );

        let response = self
            .client
            .post(self.posts_endpoint(feed_id))
            .json(&BulkRequest { posts, profile_id })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let job_id = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(extract_job_id);
        debug!("Job response for feed {}: {}", feed_id, body);
        info!(
            "Submitted job for feed {}, job_id: {}",
            feed_id,
            job_id.as_deref().unwrap_or("none")
        );
        Ok(job_id)
    }
}

/// Job id from `job.id`, `job_id` or `id`, in that order.
fn extract_job_id(response: &Value) -> Option<String> {
    let candidates = [
        response.get("job").and_then(|job| job.get("id")),
        response.get("job_id"),
        response.get("id"),
    ];
    candidates.into_iter().flatten().find_map(|value| match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
