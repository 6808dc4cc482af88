//! Picking one authoritative date per post.
//!
//! A post can carry up to four independent dates: the sitemap `lastmod`,
//! a content-derived `htmldate`, the article `publish_date` and the
//! `Last-Modified` header. A [`DateOrder`] ranks them; [`resolve_date`]
//! returns the first one present, or the run-wide fallback.
//!
//! ```rust
//! use sitemap2posts_core::{DateCandidates, DateOrder, Timestamp, resolve_date};
//!
//! let candidates = DateCandidates {
//!     lastmod: Timestamp::parse("2023-01-01"),
//!     publish_date: Timestamp::parse("2023-03-01"),
//!     ..DateCandidates::default()
//! };
//! let fallback = Timestamp::parse("2024-06-01").unwrap();
//!
//! let order: DateOrder = "PLHM".parse().unwrap();
//! assert_eq!(resolve_date(&order, &candidates, fallback).to_iso8601(), "2023-03-01T00:00:00");
//! ```

use crate::{Error, Result, Timestamp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One of the four competing date sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateSource {
    /// `L` - sitemap `<lastmod>`.
    Lastmod,
    /// `H` - date inferred from page content.
    Htmldate,
    /// `P` - article publication metadata.
    PublishDate,
    /// `M` - `Last-Modified` response header.
    ModifiedHeader,
}

impl DateSource {
    /// Single-letter code used in date order strings.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Lastmod => 'L',
            Self::Htmldate => 'H',
            Self::PublishDate => 'P',
            Self::ModifiedHeader => 'M',
        }
    }

    fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'L' => Some(Self::Lastmod),
            'H' => Some(Self::Htmldate),
            'P' => Some(Self::PublishDate),
            'M' => Some(Self::ModifiedHeader),
            _ => None,
        }
    }
}

/// Priority order over the four date sources.
///
/// Parsed from a four-letter permutation of `L`, `H`, `P`, `M`
/// (case-insensitive). The default is `LPHM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateOrder([DateSource; 4]);

impl DateOrder {
    /// The sources from highest to lowest priority.
    #[must_use]
    pub const fn sources(&self) -> &[DateSource; 4] {
        &self.0
    }
}

impl Default for DateOrder {
    fn default() -> Self {
        Self([
            DateSource::Lastmod,
            DateSource::PublishDate,
            DateSource::Htmldate,
            DateSource::ModifiedHeader,
        ])
    }
}

impl FromStr for DateOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            Error::Config(format!(
                "Invalid preferred date order '{s}': {reason} (expected a permutation of LHPM)"
            ))
        };

        let codes: Vec<char> = s.trim().chars().collect();
        if codes.len() != 4 {
            return Err(invalid("must be exactly four letters"));
        }

        let mut sources = Vec::with_capacity(4);
        for code in codes {
            let source = DateSource::from_code(code)
                .ok_or_else(|| invalid(&format!("unknown source '{code}'")))?;
            if sources.contains(&source) {
                return Err(invalid(&format!("'{}' appears twice", source.code())));
            }
            sources.push(source);
        }

        Ok(Self([sources[0], sources[1], sources[2], sources[3]]))
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for source in &self.0 {
            write!(f, "{}", source.code())?;
        }
        Ok(())
    }
}

impl Serialize for DateOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The candidate dates gathered for one post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateCandidates {
    /// Sitemap `<lastmod>`.
    pub lastmod: Option<Timestamp>,
    /// Content-derived date.
    pub htmldate: Option<Timestamp>,
    /// Article publication date.
    pub publish_date: Option<Timestamp>,
    /// `Last-Modified` header.
    pub modified_header: Option<Timestamp>,
}

impl DateCandidates {
    /// The candidate for a given source, if present.
    #[must_use]
    pub const fn get(&self, source: DateSource) -> Option<Timestamp> {
        match source {
            DateSource::Lastmod => self.lastmod,
            DateSource::Htmldate => self.htmldate,
            DateSource::PublishDate => self.publish_date,
            DateSource::ModifiedHeader => self.modified_header,
        }
    }
}

/// Return the highest-priority candidate present, or `fallback` when none is.
///
/// `fallback` is captured once per run so every undated post of that run
/// shares the same value.
#[must_use]
pub fn resolve_date(
    order: &DateOrder,
    candidates: &DateCandidates,
    fallback: Timestamp,
) -> Timestamp {
    order
        .sources()
        .iter()
        .find_map(|source| candidates.get(*source))
        .unwrap_or(fallback)
}
