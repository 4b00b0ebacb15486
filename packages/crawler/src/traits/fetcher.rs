//! Fetcher trait for retrieving pages over HTTP.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchResult;

/// A fetched response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: String,

    pub status_code: u16,

    /// Body when the response is HTML, `None` otherwise
    pub html: Option<String>,
}

impl FetchedPage {
    pub fn html(final_url: impl Into<String>, status_code: u16, html: impl Into<String>) -> Self {
        Self {
            final_url: final_url.into(),
            status_code,
            html: Some(html.into()),
        }
    }

    pub fn non_html(final_url: impl Into<String>, status_code: u16) -> Self {
        Self {
            final_url: final_url.into(),
            status_code,
            html: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Fetches a single URL.
///
/// Implementations follow redirects (bounded), apply a timeout, and return
/// every HTTP status normally. Errors are reserved for network-level
/// failures.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;
}
