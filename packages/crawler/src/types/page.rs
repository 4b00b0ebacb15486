//! Page types - crawled pages, frontier entries and parsed metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crawled page of a job.
///
/// Identity is `(crawl_job_id, normalized_url)`. Out-counts are fixed when the
/// page is created; in-counts are reconciled when the traversal finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub crawl_job_id: Uuid,

    /// Canonical identity of the page
    pub normalized_url: String,

    /// Resolved URL after redirects, as first fetched
    pub original_url: String,

    pub status_code: u16,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,

    /// Depth at which the page was first seen (seed = 0)
    pub depth: u32,

    pub internal_links_out: u32,
    pub external_links_out: u32,
    pub internal_links_in: u32,
    pub external_links_in: u32,

    /// Distinct internal targets, canonical, in discovery order
    #[serde(default)]
    pub internal_links: Vec<String>,

    /// Distinct external targets, canonical, in discovery order
    #[serde(default)]
    pub external_links: Vec<String>,

    pub crawled_at: DateTime<Utc>,
}

impl Page {
    /// Create a page record with zeroed link counts.
    pub fn new(
        crawl_job_id: Uuid,
        normalized_url: impl Into<String>,
        original_url: impl Into<String>,
        status_code: u16,
        depth: u32,
    ) -> Self {
        Self {
            crawl_job_id,
            normalized_url: normalized_url.into(),
            original_url: original_url.into(),
            status_code,
            title: None,
            h1: None,
            meta_description: None,
            canonical: None,
            depth,
            internal_links_out: 0,
            external_links_out: 0,
            internal_links_in: 0,
            external_links_in: 0,
            internal_links: Vec::new(),
            external_links: Vec::new(),
            crawled_at: Utc::now(),
        }
    }

    /// Copy parsed metadata onto the page.
    pub fn with_metadata(mut self, metadata: PageMetadata) -> Self {
        self.title = metadata.title;
        self.h1 = metadata.h1;
        self.meta_description = metadata.meta_description;
        self.canonical = metadata.canonical;
        self
    }

    /// Set outbound targets; out-counts follow from them.
    pub fn with_links(mut self, internal: Vec<String>, external: Vec<String>) -> Self {
        self.internal_links_out = internal.len() as u32;
        self.external_links_out = external.len() as u32;
        self.internal_links = internal;
        self.external_links = external;
        self
    }
}

/// A URL waiting to be crawled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub normalized_url: String,
    pub depth: u32,

    /// Absolute URL as resolved from the referring page
    pub original_url: String,
}

impl FrontierEntry {
    pub fn new(normalized_url: impl Into<String>, depth: u32, original_url: impl Into<String>) -> Self {
        Self {
            normalized_url: normalized_url.into(),
            depth,
            original_url: original_url.into(),
        }
    }
}

/// Metadata parsed from a page's `<head>` and first `<h1>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub h1: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_links_sets_out_counts() {
        let page = Page::new(Uuid::new_v4(), "https://example.com/", "https://example.com/", 200, 0)
            .with_links(
                vec!["https://example.com/about".into(), "https://example.com/blog".into()],
                vec!["https://external.org/".into()],
            );

        assert_eq!(page.internal_links_out, 2);
        assert_eq!(page.external_links_out, 1);
        assert_eq!(page.internal_links_in, 0);
    }
}
