//! Typed errors for the crawler library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so the server can
//! map each failure class onto a job state or an HTTP status.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a [`Fetcher`](crate::traits::fetcher::Fetcher).
///
/// Only network-level failures are errors; any HTTP status is a normal
/// response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request exceeded the fetch timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Redirect chain exceeded the limit
    #[error("too many redirects: {url}")]
    TooManyRedirects { url: String },

    /// URL could not be parsed or is not HTTP(S)
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Errors raised by the persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend operation failed
    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A write conflicted with an existing row
    #[error("conflict on {key}")]
    Conflict { key: String },

    /// Record expected to exist was not found
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    /// Stored value could not be decoded
    #[error("invalid stored value: {0}")]
    Decode(String),
}

/// Errors that end a crawl run.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed domain could not be canonicalized or is outside its own scope
    #[error("invalid seed URL: {seed}")]
    InvalidSeed { seed: String },

    /// Crawl job does not exist
    #[error("crawl job not found: {0}")]
    JobNotFound(Uuid),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Run was cancelled by a watchdog
    #[error("crawl cancelled")]
    Cancelled,
}

/// Errors that end an extraction run or prevent it from starting.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Crawl job does not exist
    #[error("crawl job not found: {0}")]
    CrawlJobNotFound(Uuid),

    /// Extraction job does not exist
    #[error("extraction job not found: {0}")]
    JobNotFound(Uuid),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for crawl operations.
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
