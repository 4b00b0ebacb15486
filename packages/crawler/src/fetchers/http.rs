//! HTTP fetcher backed by reqwest.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedPage, Fetcher};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_REDIRECTS: usize = 10;
const DEFAULT_USER_AGENT: &str = "SiteCrawler/1.0 (+sitemap analysis)";

/// Fetches pages with a bounded timeout and redirect chain.
///
/// # Example
///
/// ```rust,ignore
/// use site_crawler::{Fetcher, HttpFetcher};
///
/// let fetcher = HttpFetcher::new()?;
/// let page = fetcher.fetch("https://example.com/").await?;
/// ```
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a 10 s timeout and at most 10 redirects.
    pub fn new() -> FetchResult<Self> {
        Self::with_limits(DEFAULT_TIMEOUT, DEFAULT_MAX_REDIRECTS)
    }

    pub fn with_limits(timeout: Duration, max_redirects: usize) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                classify(url, e)
            })?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(is_html_content_type)
            // No content type: let the parser try
            .unwrap_or(true);

        if !is_html {
            debug!(url = %url, status_code, "Non-HTML response");
            return Ok(FetchedPage::non_html(final_url, status_code));
        }

        let html = response.text().await.map_err(|e| classify(url, e))?;
        Ok(FetchedPage::html(final_url, status_code, html))
    }
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_redirect() {
        FetchError::TooManyRedirects {
            url: url.to_string(),
        }
    } else if error.is_builder() {
        FetchError::InvalidUrl {
            url: url.to_string(),
        }
    } else {
        FetchError::Http(Box::new(error))
    }
}

fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_content_types() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=UTF-8"));
        assert!(is_html_content_type("Application/XHTML+XML"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("application/json"));
        assert!(!is_html_content_type("text/plain"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let fetcher = HttpFetcher::new().unwrap();
        assert!(fetcher.fetch("not a url").await.is_err());
    }
}
