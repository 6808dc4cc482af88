//! Ordering and export of the final post list.

use crate::types::{PostPayload, PostRecord};
use crate::{Error, Result};
use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

/// Sort posts by source sitemap (descending), then resolved date (descending).
///
/// The sort is stable. Dates are compared on a single timeline for the
/// whole list: as instants when every resolved date carries an offset,
/// as wall-clock values otherwise, so the ordering is total even when
/// naive and aware dates are mixed.
///
/// ```
/// use sitemap2posts_core::assemble::sort_posts;
/// # use sitemap2posts_core::{PostRecord, Timestamp};
/// # fn post(url: &str, sitemap: &str, date: &str) -> PostRecord {
/// #     PostRecord {
/// #         url: url.into(), lastmod: None, title: url.into(), authors: None, tags: None,
/// #         meta_keywords: None, meta_description: None, publish_date: None, htmldate: None,
/// #         modified_header: None, resolved_date: Timestamp::parse(date).unwrap(), sitemap: sitemap.into(),
/// #     }
/// # }
///
/// let sorted = sort_posts(vec![
///     post("a", "post-sitemap.xml", "2024-01-01"),
///     post("b", "post-sitemap2.xml", "2023-01-01"),
///     post("c", "post-sitemap.xml", "2024-06-01"),
/// ]);
/// let order: Vec<&str> = sorted.iter().map(|p| p.url.as_str()).collect();
/// assert_eq!(order, vec!["b", "c", "a"]);
/// ```
#[must_use]
pub fn sort_posts(mut posts: Vec<PostRecord>) -> Vec<PostRecord> {
    let as_instant = posts.iter().all(|p| p.resolved_date.is_aware());
    posts.sort_by(|a, b| compare_posts(a, b, as_instant));
    posts
}

/// Convert posts into the flat export shape, keeping their order.
#[must_use]
pub fn to_payloads(posts: &[PostRecord]) -> Vec<PostPayload> {
    posts.iter().map(PostRecord::to_payload).collect()
}

/// Serialize payloads as a pretty-printed JSON array.
pub fn to_json(payloads: &[PostPayload]) -> Result<String> {
    Ok(serde_json::to_string_pretty(payloads)?)
}

/// Write payloads as JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json(payloads: &[PostPayload], path: Option<&Path>) -> Result<()> {
    let mut json = to_json(payloads)?;
    json.push('\n');

    match path {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Wrote {} post(s) to {}", payloads.len(), path.display());
        },
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(json.as_bytes()).map_err(Error::Io)?;
            handle.flush().map_err(Error::Io)?;
        },
    }
    Ok(())
}

/// Compare two posts the way [`sort_posts`] does, for a given timeline.
#[must_use]
pub fn compare_posts(a: &PostRecord, b: &PostRecord, as_instant: bool) -> Ordering {
    b.sitemap.cmp(&a.sitemap).then_with(|| {
        b.resolved_date
            .project(as_instant)
            .cmp(&a.resolved_date.project(as_instant))
    })
}
