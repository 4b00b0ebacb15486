//! HTML parser built on `scraper`.
//!
//! Parsing never fails: malformed markup yields whatever `html5ever`
//! recovers, and missing elements become `None` or empty vectors.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

use crate::traits::parser::HtmlParser;
use crate::types::content::{ExtractedContent, Headings, OpenGraph, SchemaBlock, SeoBlock};
use crate::types::page::PageMetadata;

/// Elements whose text never counts as page content.
const EXCLUDED_TEXT_ELEMENTS: &[&str] = &["script", "style", "iframe", "embed", "object", "svg"];

/// Stateless `scraper`-backed parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperParser;

impl ScraperParser {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlParser for ScraperParser {
    fn parse_metadata(&self, html: &str) -> PageMetadata {
        let document = Html::parse_document(html);
        PageMetadata {
            title: extract_title(&document),
            h1: select_all_text(&document, "h1").into_iter().next(),
            meta_description: meta_content(&document, "description"),
            canonical: extract_canonical(&document),
        }
    }

    fn extract_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let Some(selector) = selector("a[href]") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .collect()
    }

    fn extract_content(&self, html: &str) -> ExtractedContent {
        let document = Html::parse_document(html);

        ExtractedContent {
            clean_text: extract_clean_text(&document),
            headings: extract_headings(&document),
            seo: extract_seo(&document),
            schema: SchemaBlock {
                json_ld: extract_json_ld(&document),
            },
        }
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Collapse runs of whitespace into single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn select_all_text(document: &Html, css: &str) -> Vec<String> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = selector("title")?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Content of the first `<meta name=...>` matching `name`, case-insensitively.
fn meta_content(document: &Html, name: &str) -> Option<String> {
    meta_by_attr(document, "name", name)
}

fn meta_by_attr(document: &Html, attr: &str, value: &str) -> Option<String> {
    let selector = selector("meta")?;
    document
        .select(&selector)
        .filter(|el| {
            el.value()
                .attr(attr)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(value))
        })
        .find_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Open Graph tags are specified with `property`, but many sites use `name`.
fn og_content(document: &Html, property: &str) -> Option<String> {
    meta_by_attr(document, "property", property).or_else(|| meta_by_attr(document, "name", property))
}

fn extract_canonical(document: &Html) -> Option<String> {
    let selector = selector("link[rel][href]")?;
    document
        .select(&selector)
        .find(|el| {
            el.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("canonical"))
            })
        })
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

fn extract_clean_text(document: &Html) -> String {
    let root = selector("body")
        .and_then(|s| document.select(&s).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let excluded = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| EXCLUDED_TEXT_ELEMENTS.contains(&el.name()))
        });
        if !excluded {
            parts.push(text);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

fn extract_headings(document: &Html) -> Headings {
    Headings {
        h1: select_all_text(document, "h1"),
        h2: select_all_text(document, "h2"),
        h3: select_all_text(document, "h3"),
    }
}

fn extract_seo(document: &Html) -> SeoBlock {
    SeoBlock {
        title: extract_title(document),
        meta_description: meta_content(document, "description"),
        canonical_url: extract_canonical(document),
        robots: meta_content(document, "robots"),
        og: OpenGraph {
            title: og_content(document, "og:title"),
            description: og_content(document, "og:description"),
            image: og_content(document, "og:image"),
        },
    }
}

/// Parse every `application/ld+json` script. Arrays contribute their
/// elements; a block that fails to parse is skipped.
fn extract_json_ld(document: &Html) -> Vec<serde_json::Value> {
    let Some(selector) = selector("script[type]") else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for script in document.select(&selector) {
        let is_json_ld = script
            .value()
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"));
        if !is_json_ld {
            continue;
        }

        let raw: String = script.text().collect();
        match serde_json::from_str::<serde_json::Value>(raw.trim()) {
            Ok(serde_json::Value::Array(items)) => blocks.extend(items),
            Ok(value) => blocks.push(value),
            Err(e) => {
                warn!(error = %e, "Skipping malformed JSON-LD block");
            }
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>  About   Us </title>
  <meta name="Description" content="Who we are">
  <meta name="robots" content="index, follow">
  <meta property="og:title" content="About OG">
  <meta property="og:image" content="https://example.com/og.png">
  <link rel="canonical" href="https://example.com/about">
  <style>body { color: red; }</style>
  <script type="application/ld+json">{"@type": "Organization", "name": "Example"}</script>
  <script type="application/ld+json">[{"@type": "WebPage"}, {"@type": "BreadcrumbList"}]</script>
  <script type="application/ld+json">{ not json </script>
</head>
<body>
  <h1>First heading</h1>
  <p>Some   <b>body</b>
     text.</p>
  <h2>Sub one</h2>
  <script>var hidden = "script text";</script>
  <h1>Second heading</h1>
  <svg><text>vector label</text></svg>
  <iframe>frame text</iframe>
  <h3>Deep</h3>
  <h2>Sub two</h2>
  <a href="/about">About</a>
  <a href="  https://external.org/x ">External</a>
  <a href="">Empty</a>
  <a>No href</a>
</body>
</html>"#;

    #[test]
    fn test_metadata() {
        let meta = ScraperParser::new().parse_metadata(PAGE);

        assert_eq!(meta.title.as_deref(), Some("About Us"));
        assert_eq!(meta.h1.as_deref(), Some("First heading"));
        assert_eq!(meta.meta_description.as_deref(), Some("Who we are"));
        assert_eq!(meta.canonical.as_deref(), Some("https://example.com/about"));
    }

    #[test]
    fn test_metadata_missing_fields_are_none() {
        let meta = ScraperParser::new().parse_metadata("<html><body><p>x</p></body></html>");
        assert_eq!(meta, PageMetadata::default());
    }

    #[test]
    fn test_links_are_raw_hrefs() {
        let links = ScraperParser::new().extract_links(PAGE);
        assert_eq!(links, vec!["/about", "https://external.org/x"]);
    }

    #[test]
    fn test_clean_text_strips_non_content_elements() {
        let content = ScraperParser::new().extract_content(PAGE);

        assert!(content.clean_text.contains("Some body text."));
        assert!(content.clean_text.contains("First heading"));
        assert!(!content.clean_text.contains("script text"));
        assert!(!content.clean_text.contains("vector label"));
        assert!(!content.clean_text.contains("frame text"));
        assert!(!content.clean_text.contains("color: red"));
        assert!(!content.clean_text.contains("  "));
    }

    #[test]
    fn test_headings_in_document_order() {
        let content = ScraperParser::new().extract_content(PAGE);

        assert_eq!(content.headings.h1, vec!["First heading", "Second heading"]);
        assert_eq!(content.headings.h2, vec!["Sub one", "Sub two"]);
        assert_eq!(content.headings.h3, vec!["Deep"]);
    }

    #[test]
    fn test_seo_block() {
        let seo = ScraperParser::new().extract_content(PAGE).seo;

        assert_eq!(seo.title.as_deref(), Some("About Us"));
        assert_eq!(seo.robots.as_deref(), Some("index, follow"));
        assert_eq!(seo.og.title.as_deref(), Some("About OG"));
        assert_eq!(seo.og.description, None);
        assert_eq!(seo.og.image.as_deref(), Some("https://example.com/og.png"));
    }

    #[test]
    fn test_malformed_json_ld_only_skips_that_block() {
        let schema = ScraperParser::new().extract_content(PAGE).schema;

        let types: Vec<&str> = schema
            .json_ld
            .iter()
            .filter_map(|v| v.get("@type").and_then(|t| t.as_str()))
            .collect();
        assert_eq!(types, vec!["Organization", "WebPage", "BreadcrumbList"]);
    }

    #[test]
    fn test_garbage_input_does_not_panic() {
        let parser = ScraperParser::new();
        let content = parser.extract_content("<<<>>> <div <p unclosed");
        assert!(content.schema.json_ld.is_empty());
        assert!(parser.extract_links("").is_empty());
    }
}
