//! Extracted content records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Headings in document order, grouped by level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
}

/// Open Graph fields. Missing tags stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// SEO metadata. Nothing is inferred: a field without its tag is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoBlock {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical_url: Option<String>,
    pub robots: Option<String>,
    pub og: OpenGraph,
}

/// Structured data blocks, stored raw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaBlock {
    pub json_ld: Vec<serde_json::Value>,
}

/// Output of the parser's content extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub clean_text: String,
    pub headings: Headings,
    pub seo: SeoBlock,
    pub schema: SchemaBlock,
}

/// Persisted content of one page. Unique per `(crawl_job_id, normalized_url)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub crawl_job_id: Uuid,
    pub normalized_url: String,
    pub clean_text: String,
    pub headings: Headings,
    pub seo: SeoBlock,
    pub schema: SchemaBlock,
    pub raw_html: String,
    pub fetched_at: DateTime<Utc>,
    pub schema_version: i32,
}

impl ContentRecord {
    pub fn new(
        crawl_job_id: Uuid,
        normalized_url: impl Into<String>,
        content: ExtractedContent,
        raw_html: impl Into<String>,
        schema_version: i32,
    ) -> Self {
        Self {
            crawl_job_id,
            normalized_url: normalized_url.into(),
            clean_text: content.clean_text,
            headings: content.headings,
            seo: content.seo,
            schema: content.schema,
            raw_html: raw_html.into(),
            fetched_at: Utc::now(),
            schema_version,
        }
    }
}
