//! External link registry types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Occurrences of one external destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLinkRecord {
    /// Every reference counts, including repeats on the same page
    pub occurrences: u64,

    /// Canonical URLs of the pages linking here
    pub referrers: BTreeSet<String>,
}

/// Job-level map of external destination → record, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalLinkRegistry(IndexMap<String, ExternalLinkRecord>);

impl ExternalLinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one reference from `referrer` to `target`.
    pub fn record(&mut self, target: &str, referrer: &str) {
        let entry = self.0.entry(target.to_string()).or_default();
        entry.occurrences += 1;
        entry.referrers.insert(referrer.to_string());
    }

    pub fn get(&self, target: &str) -> Option<&ExternalLinkRecord> {
        self.0.get(target)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExternalLinkRecord)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_every_reference() {
        let mut registry = ExternalLinkRegistry::new();
        registry.record("https://external.org/", "https://example.com/");
        registry.record("https://external.org/", "https://example.com/");
        registry.record("https://external.org/", "https://example.com/about");

        let record = registry.get("https://external.org/").unwrap();
        assert_eq!(record.occurrences, 3);
        assert_eq!(record.referrers.len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut registry = ExternalLinkRegistry::new();
        registry.record("https://external.org/", "https://example.com/");

        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["https://external.org/"]["occurrences"], 1);
    }
}
