//! Timestamps that remember whether they carried an offset.
//!
//! Sitemaps, HTML metadata and HTTP headers disagree about time zones: a
//! `<lastmod>` is often a bare date, `article:published_time` usually has an
//! offset, `Last-Modified` is always GMT. [`Timestamp`] keeps that distinction
//! instead of silently pinning naive values to UTC.
//!
//! Comparison rules:
//!
//! - aware vs aware compares instants;
//! - as soon as one side is naive, the other side's offset is stripped and
//!   the two wall-clock values are compared.
//!
//! ```rust
//! use sitemap2posts_core::Timestamp;
//! use std::cmp::Ordering;
//!
//! let naive = Timestamp::parse("2024-01-15T10:00:00").unwrap();
//! let aware = Timestamp::parse("2024-01-15T09:00:00-05:00").unwrap();
//!
//! // 09:00 local wall-clock is earlier than 10:00, whatever the offset says
//! assert_eq!(aware.compare(&naive), Ordering::Less);
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Formats with an explicit offset, tried after RFC 3339 and RFC 2822.
const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Formats without an offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// A point in time that is either naive (no offset) or offset-aware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timestamp {
    /// Wall-clock value without any zone information.
    Naive(NaiveDateTime),
    /// Value with a fixed UTC offset.
    Aware(DateTime<FixedOffset>),
}

impl Timestamp {
    /// Parse the date formats found in sitemaps, HTML metadata and HTTP headers.
    ///
    /// Accepts RFC 3339 / ISO 8601 with or without offset, RFC 2822
    /// (`Last-Modified`), date only (`2024-01-15`) and the reduced W3C
    /// forms `2024-01` and `2024`. Date-only values become naive midnight.
    /// Anything unrecognized yields `None`; a malformed date is never an error.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self::Aware(dt));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(Self::Aware(dt));
        }
        for format in AWARE_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(s, format) {
                return Some(Self::Aware(dt));
            }
        }
        for format in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(Self::Naive(dt));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(Self::Naive(date.and_hms_opt(0, 0, 0)?));
        }
        // W3C datetime allows year-month and bare year
        if s.len() == 7 {
            if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
                return Some(Self::Naive(date.and_hms_opt(0, 0, 0)?));
            }
        }
        if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
            let year: i32 = s.parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
            return Some(Self::Naive(date.and_hms_opt(0, 0, 0)?));
        }

        tracing::debug!(date_str = %s, "Could not parse timestamp");
        None
    }

    /// Midnight UTC of the given calendar day, as an aware value.
    pub fn start_of_day_utc(date: NaiveDate) -> Option<Self> {
        let naive = date.and_hms_opt(0, 0, 0)?;
        Some(Self::Aware(Utc.from_utc_datetime(&naive).fixed_offset()))
    }

    /// Whether the value carries an offset.
    #[must_use]
    pub const fn is_aware(&self) -> bool {
        matches!(self, Self::Aware(_))
    }

    /// Wall-clock time, dropping the offset if there is one.
    #[must_use]
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Self::Naive(dt) => *dt,
            Self::Aware(dt) => dt.naive_local(),
        }
    }

    /// Compare two timestamps after normalizing their offset-awareness.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Aware(a), Self::Aware(b)) => a.cmp(b),
            _ => self.naive_local().cmp(&other.naive_local()),
        }
    }

    /// `true` when `self` is strictly earlier than `other`.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Less
    }

    /// Project onto a single naive timeline.
    ///
    /// With `as_instant` every aware value is converted to UTC; otherwise the
    /// offset is stripped. Projecting a whole collection the same way gives
    /// a total order suitable for sorting.
    #[must_use]
    pub fn project(&self, as_instant: bool) -> NaiveDateTime {
        match self {
            Self::Aware(dt) if as_instant => dt.naive_utc(),
            _ => self.naive_local(),
        }
    }

    /// ISO 8601 representation (`2024-01-15T10:30:00` or `2024-01-15T10:30:00+02:00`).
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        match self {
            Self::Naive(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Self::Aware(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Aware(value.fixed_offset())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn test_parses_date_only_as_naive() {
        let value = ts("2024-01-15");
        assert!(!value.is_aware());
        assert_eq!(value.to_iso8601(), "2024-01-15T00:00:00");
    }

    #[test]
    fn test_parses_rfc3339_variants() {
        assert!(ts("2024-01-15T10:30:00Z").is_aware());
        assert!(ts("2024-01-15T10:30:00+02:00").is_aware());
        assert!(ts("2024-01-15T10:30:00.123Z").is_aware());
        assert!(ts("2024-01-15 10:30:00+0200").is_aware());
        assert!(ts("2024-01-15T10:30+01:00").is_aware());
    }

    #[test]
    fn test_parses_naive_datetimes() {
        assert!(!ts("2024-01-15T10:30:00").is_aware());
        assert!(!ts("2024-01-15T10:30:00.500").is_aware());
        assert!(!ts("2024-01-15 10:30:00").is_aware());
    }

    #[test]
    fn test_parses_http_dates() {
        let value = ts("Wed, 21 Oct 2015 07:28:00 GMT");
        assert!(value.is_aware());
        assert_eq!(value.to_iso8601(), "2015-10-21T07:28:00+00:00");
    }

    #[test]
    fn test_parses_reduced_w3c_forms() {
        assert_eq!(ts("2024-03").to_iso8601(), "2024-03-01T00:00:00");
        assert_eq!(ts("2024").to_iso8601(), "2024-01-01T00:00:00");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Timestamp::parse("").is_none());
        assert!(Timestamp::parse("   ").is_none());
        assert!(Timestamp::parse("yesterday").is_none());
        assert!(Timestamp::parse("2024-13-45").is_none());
    }

    #[test]
    fn test_aware_values_compare_as_instants() {
        let a = ts("2024-01-15T10:00:00+02:00"); // 08:00 UTC
        let b = ts("2024-01-15T09:00:00Z");
        assert_eq!(a.compare(&b), Ordering::Less);
        assert!(a.is_before(&b));
    }

    #[test]
    fn test_naive_comparison_strips_offset_from_other_side() {
        let naive = ts("2024-01-15T09:30:00");
        let aware = ts("2024-01-15T10:00:00+05:00"); // 05:00 UTC, but 10:00 wall-clock
        assert_eq!(naive.compare(&aware), Ordering::Less);
        assert_eq!(aware.compare(&naive), Ordering::Greater);
    }

    #[test]
    fn test_equal_wall_clock_is_equal() {
        let naive = ts("2023-01-01");
        let aware = ts("2023-01-01T00:00:00-08:00");
        assert_eq!(naive.compare(&aware), Ordering::Equal);
        assert!(!naive.is_before(&aware));
    }

    #[test]
    fn test_projection() {
        let aware = ts("2024-01-15T10:00:00+02:00");
        assert_eq!(aware.project(true).to_string(), "2024-01-15 08:00:00");
        assert_eq!(aware.project(false).to_string(), "2024-01-15 10:00:00");
    }

    #[test]
    fn test_start_of_day_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let value = Timestamp::start_of_day_utc(date).unwrap();
        assert!(value.is_aware());
        assert_eq!(value.to_iso8601(), "2024-05-01T00:00:00+00:00");
    }

    #[test]
    fn test_serializes_as_iso_string() {
        let json = serde_json::to_string(&ts("2024-01-15T10:30:00Z")).unwrap();
        assert_eq!(json, "\"2024-01-15T10:30:00+00:00\"");
    }
}
