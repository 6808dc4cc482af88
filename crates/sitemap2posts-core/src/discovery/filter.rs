//! URL filtering between deduplication and extraction.
//!
//! The [`FilterChain`] runs four stages in a fixed order:
//!
//! 1. **Base URL**: the URL must start with the configured base URL (literal prefix)
//! 2. **Minimum date**: a URL whose lastmod is earlier than `lastmod_min` is
//!    dropped; a URL without lastmod passes
//! 3. **Allow list**: when non-empty, the URL must match at least one pattern
//! 4. **Ignore list**: the URL must match none of the patterns
//!
//! Patterns are filename-style globs matched against the whole URL:
//!
//! ```rust
//! use sitemap2posts_core::discovery::filter::GlobPattern;
//!
//! let pattern = GlobPattern::new("https://example.com/blog/*").unwrap();
//! assert!(pattern.matches("https://example.com/blog/2024/01/hello"));
//! assert!(!pattern.matches("https://example.com/about"));
//!
//! let draft = GlobPattern::new("*/draft-?").unwrap();
//! assert!(draft.matches("https://example.com/draft-1"));
//! assert!(!draft.matches("https://example.com/draft-10"));
//! ```

use super::dedupe::DedupedUrls;
use crate::types::DedupedEntry;
use crate::{CrawlConfig, Error, Result, Timestamp};
use regex::Regex;
use tracing::info;

/// A compiled filename-style glob.
///
/// `*` matches any run of characters (including `/`), `?` matches one
/// character, `[seq]` matches one character in the set and `[!seq]` one
/// character outside it. An unterminated `[` is literal. Matching is
/// case-sensitive and covers the entire input.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] when a character class is invalid
    /// (for example a reversed range such as `[z-a]`).
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&translate(pattern)).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Whether the whole `url` matches.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// The glob as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Translate a glob into an anchored regex.
fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from(r"(?s)\A(?:");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                // Collapse runs of stars
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                out.push_str(".*");
            },
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if chars.get(j) == Some(&'!') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str(r"\[");
                } else {
                    out.push_str(&translate_class(&chars[i..j]));
                    i = j + 1;
                }
            },
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push_str(r")\z");
    out
}

fn translate_class(set: &[char]) -> String {
    let (negated, body) = match set.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, set),
    };

    let mut class = String::from("[");
    if negated {
        class.push('^');
    }
    for &c in body {
        if c == '-' {
            class.push('-');
        } else {
            class.push_str(&regex::escape(&c.to_string()));
        }
    }
    class.push(']');
    class
}

/// The compiled filter stages of one run.
#[derive(Debug, Clone)]
pub struct FilterChain {
    base_url: String,
    lastmod_min: Option<Timestamp>,
    allow: Vec<GlobPattern>,
    ignore: Vec<GlobPattern>,
}

impl FilterChain {
    /// Compile the filters of a crawl configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first glob that fails to
    /// compile, before any URL is filtered.
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<GlobPattern>> {
            patterns.iter().map(|p| GlobPattern::new(p)).collect()
        };
        Ok(Self {
            base_url: config.base_url.clone(),
            lastmod_min: config.lastmod_min,
            allow: compile(&config.path_allow_list)?,
            ignore: compile(&config.path_ignore_list)?,
        })
    }

    /// Whether `url` lies under the base URL.
    #[must_use]
    pub fn within_base(&self, url: &str) -> bool {
        url.starts_with(&self.base_url)
    }

    /// Whether a lastmod clears the minimum date. Absent values pass.
    #[must_use]
    pub fn meets_lastmod_min(&self, lastmod: Option<&Timestamp>) -> bool {
        match (self.lastmod_min.as_ref(), lastmod) {
            (Some(min), Some(value)) => !value.is_before(min),
            _ => true,
        }
    }

    /// Whether `url` is admitted by the allow list.
    #[must_use]
    pub fn allowed(&self, url: &str) -> bool {
        self.allow.is_empty() || self.allow.iter().any(|p| p.matches(url))
    }

    /// Whether `url` is excluded by the ignore list.
    #[must_use]
    pub fn ignored(&self, url: &str) -> bool {
        self.ignore.iter().any(|p| p.matches(url))
    }

    /// Run every stage in order, logging how many URLs each one removed.
    pub fn apply(&self, urls: &mut DedupedUrls) {
        run_stage(urls, "outside base URL", |url, _| self.within_base(url));
        if let Some(min) = &self.lastmod_min {
            let label = format!("last modified before {min}");
            run_stage(urls, &label, |_, entry| {
                self.meets_lastmod_min(entry.lastmod.as_ref())
            });
        }
        if !self.allow.is_empty() {
            run_stage(urls, "not in allow list", |url, _| self.allowed(url));
        }
        if !self.ignore.is_empty() {
            run_stage(urls, "in ignore list", |url, _| !self.ignored(url));
        }
        info!("{} URL(s) left after filtering", urls.len());
    }
}

fn run_stage(urls: &mut DedupedUrls, label: &str, keep: impl FnMut(&str, &DedupedEntry) -> bool) {
    let before = urls.len();
    urls.retain(keep);
    let removed = before - urls.len();
    if removed > 0 {
        info!("Removed {} URL(s) {}", removed, label);
    }
}
