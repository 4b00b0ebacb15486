//! Parser trait for metadata, links and content extraction.

use crate::types::content::ExtractedContent;
use crate::types::page::PageMetadata;

/// Parses HTML documents. All methods are infallible: malformed markup
/// yields empty or partial results, never an error.
pub trait HtmlParser: Send + Sync {
    /// Title, first `<h1>`, meta description and canonical link.
    fn parse_metadata(&self, html: &str) -> PageMetadata;

    /// Raw `href` values of anchors, unresolved, in document order.
    fn extract_links(&self, html: &str) -> Vec<String>;

    /// Clean text, headings, SEO block and JSON-LD.
    fn extract_content(&self, html: &str) -> ExtractedContent;
}
