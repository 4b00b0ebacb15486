//! FIFO frontier with a seen-set.
//!
//! A URL is marked seen when it is enqueued, so the queue never holds the
//! same canonical URL twice.

use std::collections::{HashSet, VecDeque};

use crate::types::page::FrontierEntry;

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a URL seen without queueing it (already crawled pages on resume).
    pub fn mark_seen(&mut self, normalized_url: impl Into<String>) {
        self.seen.insert(normalized_url.into());
    }

    /// Enqueue an entry unless its URL was seen before. Returns whether it was queued.
    pub fn push(&mut self, entry: FrontierEntry) -> bool {
        if !self.seen.insert(entry.normalized_url.clone()) {
            return false;
        }
        self.queue.push_back(entry);
        true
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Put back an entry that was popped but not processed.
    pub fn requeue(&mut self, entry: FrontierEntry) {
        self.seen.insert(entry.normalized_url.clone());
        self.queue.push_front(entry);
    }

    pub fn is_seen(&self, normalized_url: &str) -> bool {
        self.seen.contains(normalized_url)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Number of distinct URLs ever seen.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Pending entries in queue order.
    pub fn snapshot(&self) -> Vec<FrontierEntry> {
        self.queue.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_and_dedup() {
        let mut frontier = Frontier::new();
        assert!(frontier.push(FrontierEntry::new("https://example.com/a", 1, "https://example.com/a")));
        assert!(frontier.push(FrontierEntry::new("https://example.com/b", 1, "https://example.com/b")));
        assert!(!frontier.push(FrontierEntry::new("https://example.com/a", 2, "https://example.com/a/")));

        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.pop().unwrap().normalized_url, "https://example.com/a");
        assert_eq!(frontier.pop().unwrap().normalized_url, "https://example.com/b");
        assert!(frontier.pop().is_none());

        // Seen survives dequeue
        assert!(!frontier.push(FrontierEntry::new("https://example.com/a", 1, "https://example.com/a")));
    }

    #[test]
    fn test_mark_seen_blocks_enqueue() {
        let mut frontier = Frontier::new();
        frontier.mark_seen("https://example.com/");
        assert!(!frontier.push(FrontierEntry::new("https://example.com/", 0, "https://example.com/")));
        assert!(frontier.is_empty());
        assert_eq!(frontier.seen_count(), 1);
    }

    #[test]
    fn test_requeue_goes_to_front() {
        let mut frontier = Frontier::new();
        frontier.push(FrontierEntry::new("https://example.com/a", 1, "https://example.com/a"));
        frontier.push(FrontierEntry::new("https://example.com/b", 1, "https://example.com/b"));

        let first = frontier.pop().unwrap();
        frontier.requeue(first);

        assert_eq!(frontier.snapshot()[0].normalized_url, "https://example.com/a");
        assert_eq!(frontier.len(), 2);
    }
}
