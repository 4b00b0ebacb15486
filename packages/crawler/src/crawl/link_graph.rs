//! Link graph accumulator.
//!
//! Out-links are collected per page while it is processed and frozen on the
//! page record. In-links accumulate across the whole traversal because a page
//! can gain inbound edges from pages crawled after it; they are only final
//! once [`LinkGraph::reconcile`] runs at the end.

use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};

use crate::types::link::ExternalLinkRegistry;
use crate::types::page::Page;

/// Distinct outbound targets of one page, in discovery order.
#[derive(Debug, Default)]
pub struct PageLinks {
    internal: IndexSet<String>,
    external: IndexSet<String>,
}

impl PageLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the target is new for this page.
    pub fn add_internal(&mut self, target: &str) -> bool {
        self.internal.insert(target.to_string())
    }

    pub fn add_external(&mut self, target: &str) -> bool {
        self.external.insert(target.to_string())
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (
            self.internal.into_iter().collect(),
            self.external.into_iter().collect(),
        )
    }
}

#[derive(Debug, Default)]
pub struct LinkGraph {
    /// target → distinct sources
    incoming: HashMap<String, HashSet<String>>,
    registry: ExternalLinkRegistry,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue accumulating into a registry persisted by an earlier run.
    pub fn with_registry(registry: ExternalLinkRegistry) -> Self {
        Self {
            incoming: HashMap::new(),
            registry,
        }
    }

    /// Re-add the edges of a page persisted by an earlier run.
    ///
    /// External references already present in the registry are left alone;
    /// a reference missing from it (the run died before the registry was
    /// saved) is recorded once.
    pub fn restore_page(&mut self, page: &Page) {
        for target in &page.internal_links {
            self.record_internal(&page.normalized_url, target);
        }
        for target in &page.external_links {
            let known = self
                .registry
                .get(target)
                .is_some_and(|record| record.referrers.contains(&page.normalized_url));
            if !known {
                self.registry.record(target, &page.normalized_url);
            }
        }
    }

    /// Record an internal edge. Self-links are ignored. Returns true for a new edge.
    pub fn record_internal(&mut self, source: &str, target: &str) -> bool {
        if source == target {
            return false;
        }
        self.incoming
            .entry(target.to_string())
            .or_default()
            .insert(source.to_string())
    }

    /// Record one reference to an external destination.
    pub fn record_external(&mut self, source: &str, target: &str) {
        self.registry.record(target, source);
    }

    /// Distinct internal sources linking to `target`.
    pub fn internal_in(&self, target: &str) -> u32 {
        self.incoming.get(target).map_or(0, |s| s.len() as u32)
    }

    /// Write final in-counts onto a page. Returns true if they changed.
    ///
    /// External in-links are not observable from a single-domain crawl and
    /// stay at zero.
    pub fn reconcile(&self, page: &mut Page) -> bool {
        let internal_in = self.internal_in(&page.normalized_url);
        if page.internal_links_in == internal_in && page.external_links_in == 0 {
            return false;
        }
        page.internal_links_in = internal_in;
        page.external_links_in = 0;
        true
    }

    pub fn registry(&self) -> &ExternalLinkRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_in_counts_are_distinct_edges() {
        let mut graph = LinkGraph::new();
        assert!(graph.record_internal("https://example.com/", "https://example.com/about"));
        assert!(!graph.record_internal("https://example.com/", "https://example.com/about"));
        assert!(graph.record_internal("https://example.com/blog", "https://example.com/about"));
        assert!(!graph.record_internal("https://example.com/about", "https://example.com/about"));

        assert_eq!(graph.internal_in("https://example.com/about"), 2);
        assert_eq!(graph.internal_in("https://example.com/missing"), 0);
    }

    #[test]
    fn test_reconcile_reports_changes() {
        let job = Uuid::new_v4();
        let mut page = Page::new(job, "https://example.com/about", "https://example.com/about", 200, 1);

        let mut graph = LinkGraph::new();
        assert!(!graph.reconcile(&mut page));

        graph.record_internal("https://example.com/", "https://example.com/about");
        assert!(graph.reconcile(&mut page));
        assert_eq!(page.internal_links_in, 1);
        assert!(!graph.reconcile(&mut page));
    }

    #[test]
    fn test_restore_page_rebuilds_edges() {
        let job = Uuid::new_v4();
        let home = Page::new(job, "https://example.com/", "https://example.com/", 200, 0)
            .with_links(vec!["https://example.com/about".into()], vec![]);

        let mut graph = LinkGraph::new();
        graph.restore_page(&home);
        // A re-discovered edge does not double count
        graph.record_internal("https://example.com/", "https://example.com/about");

        assert_eq!(graph.internal_in("https://example.com/about"), 1);
    }

    #[test]
    fn test_restore_page_repairs_missing_registry_entries() {
        let job = Uuid::new_v4();
        let home = Page::new(job, "https://example.com/", "https://example.com/", 200, 0)
            .with_links(vec![], vec!["https://external.org/".into(), "https://other.net/".into()]);

        let mut registry = ExternalLinkRegistry::new();
        registry.record("https://external.org/", "https://example.com/");
        registry.record("https://external.org/", "https://example.com/");

        let mut graph = LinkGraph::with_registry(registry);
        graph.restore_page(&home);

        let registry = graph.registry();
        assert_eq!(registry.get("https://external.org/").unwrap().occurrences, 2);
        assert_eq!(registry.get("https://other.net/").unwrap().occurrences, 1);
    }

    #[test]
    fn test_page_links_dedup_preserves_order() {
        let mut links = PageLinks::new();
        assert!(links.add_internal("https://example.com/b"));
        assert!(links.add_internal("https://example.com/a"));
        assert!(!links.add_internal("https://example.com/b"));
        links.add_external("https://external.org/");

        let (internal, external) = links.into_parts();
        assert_eq!(internal, vec!["https://example.com/b", "https://example.com/a"]);
        assert_eq!(external.len(), 1);
    }
}
