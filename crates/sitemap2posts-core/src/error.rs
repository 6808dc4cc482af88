//! Error types and handling for sitemap2posts-core operations.
//!
//! Almost every failure inside a crawl is isolated to a single document: a
//! sitemap that cannot be fetched is treated as empty, a page that answers
//! with an error status is left out of the result. Those cases are logged and
//! never surface as an [`Error`]. The variants below cover what remains:
//! invalid configuration, the run-level "nothing to crawl" condition, and the
//! I/O around the pipeline (config files, exports, the submission API).
//!
//! ## Error Categories
//!
//! - **I/O Errors**: reading and writing config or export files
//! - **Network Errors**: HTTP client construction and API requests
//! - **Parse Errors**: malformed documents where a caller asked for strict parsing
//! - **Configuration Errors**: invalid settings, date orders, glob patterns
//! - **Run Errors**: no sitemap source could be found for a site
//!
//! ## Recovery Hints
//!
//! ```rust
//! use sitemap2posts_core::{Error, Result};
//!
//! fn handle(result: Result<()>) {
//!     match result {
//!         Err(e) if e.is_recoverable() => println!("temporary failure, try again later: {e}"),
//!         Err(e) => println!("{} error: {e}", e.category()),
//!         Ok(()) => println!("done"),
//!     }
//! }
//! # handle(Ok(()));
//! ```

use thiserror::Error;

/// The main error type for sitemap2posts-core operations.
///
/// All public fallible functions return `Result<T, Error>`. The underlying
/// `std::io::Error` and `reqwest::Error` values are preserved so callers can
/// inspect the source chain.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading and writing the feeds configuration and export files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Only raised where a network failure cannot be isolated to one
    /// document, e.g. when the HTTP client cannot be built or the submission
    /// API is unreachable.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Parsing operation failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Malformed feeds file
    /// - Missing `feed_id`, `profile_id` or `sitemap_urls`
    /// - A preferred date order that is not a permutation of `LHPM`
    /// - Missing API credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL is malformed or invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A glob pattern in the allow or ignore list could not be compiled.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern as written by the user.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No sitemap could be found for the site.
    ///
    /// Raised when robots.txt declares no sitemaps (or cannot be fetched)
    /// and the caller did not supply an explicit sitemap list. This is the
    /// only run-level fatal condition of the pipeline.
    #[error("Nothing to crawl: {0}")]
    NothingToCrawl(String),

    /// The remote submission API answered with an error status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body or a short description.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through a later retry.
    ///
    /// Network timeouts and connection failures, 5xx/429 API answers and
    /// interrupted I/O are considered temporary. Everything else is a
    /// permanent problem with the input or configuration.
    ///
    /// ```rust
    /// use sitemap2posts_core::Error;
    ///
    /// assert!(Error::Api { status: 503, message: "busy".into() }.is_recoverable());
    /// assert!(!Error::Config("bad order".into()).is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for structured logging and for the sync report.
    ///
    /// - `"io"` - File system operations
    /// - `"network"` - HTTP requests
    /// - `"parse"` - Document parsing
    /// - `"config"` - Configuration and patterns
    /// - `"invalid_url"` - URL validation
    /// - `"nothing_to_crawl"` - No sitemap source
    /// - `"api"` - Submission API failures
    /// - `"serialization"` - JSON conversion
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Config(_) | Self::InvalidPattern { .. } => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::NothingToCrawl(_) => "nothing_to_crawl",
            Self::Api { .. } => "api",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
