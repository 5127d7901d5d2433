//! Run-scoped, thread-safe fingerprint registry.
//!
//! Shared across every provider and every concurrent product job for the
//! duration of one run. The download stage inserts content fingerprints
//! here to avoid re-processing identical images found under different URLs.
//!
//! The set only grows. It is meant to be dropped at the end of a run; a
//! long-lived service would need an eviction policy on top.

use std::collections::HashSet;
use std::sync::Mutex;

/// Thread-safe growth-only set of opaque fingerprint strings.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    seen: Mutex<HashSet<String>>,
}

impl DedupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item` if absent.
    ///
    /// Returns `true` if the item was new, `false` if it was already
    /// present (in which case nothing changes).
    pub fn add(&self, item: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        if seen.contains(item) {
            return false;
        }
        seen.insert(item.to_owned())
    }

    /// Whether `item` has been registered.
    pub fn contains(&self, item: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(item)
    }

    /// Number of registered fingerprints.
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn add_reports_novelty() {
        let registry = DedupRegistry::new();
        assert!(registry.add("abc123"));
        assert!(!registry.add("abc123"));
        assert!(registry.add("def456"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn contains_reflects_inserts() {
        let registry = DedupRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains("abc123"));
        registry.add("abc123");
        assert!(registry.contains("abc123"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn exactly_one_thread_wins_each_item() {
        let registry = Arc::new(DedupRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| registry.add(&format!("hash-{i}")))
                        .count()
                })
            })
            .collect();

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread join"))
            .sum();
        assert_eq!(wins, 100);
        assert_eq!(registry.len(), 100);
    }
}
