//! Content-derived post dates.
//!
//! Infers when a page was published from everything except the article
//! metadata tags: structured data, `<time>` elements, modification metas,
//! the URL path and finally dates written in the visible text. The first
//! strategy that yields a plausible date wins:
//!
//! 1. JSON-LD `datePublished`, then `dateCreated`, then `dateModified`
//! 2. `<time datetime="...">`
//! 3. Modification metas (`article:modified_time`, `og:updated_time`, ...)
//! 4. Date patterns in the URL path (`/2024/01/15/`, `/2024-01-15-`, `/20240115/`)
//! 5. Dates in the text: ISO (`2024-01-15`), `January 15, 2024`, `15 January 2024`
//!
//! Dates before 1995 or more than a year in the future are discarded.

use crate::Timestamp;
use crate::article::{MetaTags, collapse_whitespace};
use chrono::{Datelike, NaiveDate, Utc};
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

/// Earliest year accepted as a publication date.
const MIN_YEAR: i32 = 1995;

/// JSON-LD properties, in priority order.
const JSON_LD_KEYS: &[&str] = &["datePublished", "dateCreated", "dateModified"];

/// `<meta>` keys declaring a modification date, in priority order.
const MODIFIED_KEYS: &[&str] = &[
    "article:modified_time",
    "og:updated_time",
    "last-modified",
    "datemodified",
    "dc.date.modified",
];

/// Longest stretch of text scanned for dates.
const MAX_TEXT_SCAN: usize = 20_000;

/// SAFETY: Selectors are compile-time constants that are known to be valid.
#[allow(clippy::unwrap_used)]
static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
#[allow(clippy::unwrap_used)]
static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time[datetime]").unwrap());
#[allow(clippy::unwrap_used)]
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Path patterns, most specific first. Groups are year, month and optional day.
///
/// SAFETY: Patterns are compile-time constants that are known to be valid.
#[allow(clippy::unwrap_used)]
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // /2024/01/15/ or /2024-01-15-slug or /2024_01_15
        Regex::new(r"(?:^|/)(\d{4})[-_/](\d{1,2})[-_/](\d{1,2})(?:[-_/.]|$)").unwrap(),
        // /20240115/
        Regex::new(r"(?:^|/)(\d{4})(\d{2})(\d{2})(?:[-_/.]|$)").unwrap(),
        // /2024/01/
        Regex::new(r"(?:^|/)(\d{4})[-_/](\d{1,2})(?:/|$)").unwrap(),
    ]
});

#[allow(clippy::unwrap_used)]
static TEXT_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec";

#[allow(clippy::unwrap_used)]
static TEXT_MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"))
        .unwrap()
});

#[allow(clippy::unwrap_used)]
static TEXT_DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTHS})\.?,?\s+(\d{{4}})\b"))
        .unwrap()
});

/// Infer the publication date of a page.
///
/// ```
/// use scraper::Html;
/// use sitemap2posts_core::htmldate::find_date;
///
/// let html = Html::parse_document("<html><body><p>Posted on March 3, 2021</p></body></html>");
/// let date = find_date(&html, "https://example.com/blog/hello").unwrap();
/// assert_eq!(date.to_iso8601(), "2021-03-03T00:00:00");
///
/// let html = Html::parse_document("<html><body></body></html>");
/// let date = find_date(&html, "https://example.com/2019/07/04/fireworks/").unwrap();
/// assert_eq!(date.to_iso8601(), "2019-07-04T00:00:00");
/// ```
#[must_use]
pub fn find_date(document: &Html, url: &str) -> Option<Timestamp> {
    from_json_ld(document)
        .or_else(|| from_time_elements(document))
        .or_else(|| from_modified_metas(document))
        .or_else(|| from_url(url))
        .or_else(|| from_text(document))
}

fn plausible(value: Timestamp) -> Option<Timestamp> {
    let year = value.naive_local().year();
    (MIN_YEAR..=Utc::now().year() + 1)
        .contains(&year)
        .then_some(value)
}

fn parse_plausible(raw: &str) -> Option<Timestamp> {
    Timestamp::parse(raw).and_then(plausible)
}

fn from_json_ld(document: &Html) -> Option<Timestamp> {
    let blocks: Vec<Value> = document
        .select(&JSON_LD)
        .filter_map(|script| {
            let raw: String = script.text().collect();
            match serde_json::from_str(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping invalid JSON-LD block: {}", e);
                    None
                },
            }
        })
        .collect();

    JSON_LD_KEYS.iter().find_map(|key| {
        blocks
            .iter()
            .find_map(|block| find_json_key(block, key).and_then(parse_plausible))
    })
}

/// Depth-first search for a string property, covering `@graph` arrays.
fn find_json_key<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    match value {
        Value::Object(map) => map
            .get(key)
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(|v| find_json_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_json_key(v, key)),
        _ => None,
    }
}

fn from_time_elements(document: &Html) -> Option<Timestamp> {
    document
        .select(&TIME)
        .filter_map(|element| element.value().attr("datetime"))
        .find_map(parse_plausible)
}

fn from_modified_metas(document: &Html) -> Option<Timestamp> {
    let metas = MetaTags::collect(document);
    MODIFIED_KEYS
        .iter()
        .filter_map(|key| metas.first(key))
        .find_map(parse_plausible)
}

fn from_url(url: &str) -> Option<Timestamp> {
    let path = Url::parse(url).map_or_else(|_| url.to_string(), |u| u.path().to_string());
    URL_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.captures(&path))
        .find_map(|caps| ymd_from_captures(&caps, 1, 2, Some(3)))
}

fn from_text(document: &Html) -> Option<Timestamp> {
    let text = document.select(&BODY).next().map_or_else(
        || collapse_whitespace(&document.root_element().text().collect::<String>()),
        |body| collapse_whitespace(&body.text().collect::<String>()),
    );
    let text = truncate(&text, MAX_TEXT_SCAN);

    TEXT_ISO
        .captures_iter(text)
        .find_map(|caps| ymd_from_captures(&caps, 1, 2, Some(3)))
        .or_else(|| {
            TEXT_MONTH_DAY_YEAR.captures_iter(text).find_map(|caps| {
                let month = month_number(caps.get(1)?.as_str())?;
                date_from_parts(caps.get(3)?.as_str(), month, caps.get(2)?.as_str())
            })
        })
        .or_else(|| {
            TEXT_DAY_MONTH_YEAR.captures_iter(text).find_map(|caps| {
                let month = month_number(caps.get(2)?.as_str())?;
                date_from_parts(caps.get(3)?.as_str(), month, caps.get(1)?.as_str())
            })
        })
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn ymd_from_captures(
    caps: &Captures<'_>,
    year: usize,
    month: usize,
    day: Option<usize>,
) -> Option<Timestamp> {
    let y: i32 = caps.get(year)?.as_str().parse().ok()?;
    let m: u32 = caps.get(month)?.as_str().parse().ok()?;
    let d: u32 = match day.and_then(|idx| caps.get(idx)) {
        Some(value) => value.as_str().parse().ok()?,
        None => 1,
    };
    let date = NaiveDate::from_ymd_opt(y, m, d)?;
    plausible(Timestamp::Naive(date.and_hms_opt(0, 0, 0)?))
}

fn date_from_parts(year: &str, month: u32, day: &str) -> Option<Timestamp> {
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)?;
    plausible(Timestamp::Naive(date.and_hms_opt(0, 0, 0)?))
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
