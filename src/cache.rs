// src/cache.rs - Process-wide classification result cache
use log::info;
use lru::LruCache;
use std::num::NonZero;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::models::ClassificationResult;

/// A cached classification keyed by comparison key.
#[derive(Debug, Clone)]
struct CacheEntry {
    result: ClassificationResult,
    inserted_at: Instant,
}

/// Bounded, TTL-checked store of prior classification results. Constructed
/// once per process and passed into the batch orchestrator; eviction is
/// oldest-access-first via the LRU discipline, and expired entries are
/// dropped on read.
pub struct ClassificationCacheStore {
    entries: LruCache<String, CacheEntry>,
    ttl: Duration,
    pub hits: usize,
    pub misses: usize,
}

impl ClassificationCacheStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        info!(
            "Initializing classification cache: capacity={}, ttl={}s",
            capacity,
            ttl.as_secs()
        );
        Self {
            entries: LruCache::new(NonZero::new(capacity).unwrap()),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<ClassificationResult> {
        let ttl = self.ttl;
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() <= ttl {
                self.hits += 1;
                return Some(entry.result.clone());
            }
            // Expired entry; drop it so it can't be resurrected.
            self.entries.pop(key);
        }
        self.misses += 1;
        None
    }

    pub fn put(&mut self, key: String, result: ClassificationResult) {
        self.entries.put(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of unexpired (key, result) pairs for fuzzy-match scans.
    /// Does not refresh recency.
    pub fn snapshot(&self) -> Vec<(String, ClassificationResult)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() <= self.ttl)
            .map(|(key, entry)| (key.clone(), entry.result.clone()))
            .collect()
    }
}

pub type SharedClassificationCache = Arc<Mutex<ClassificationCacheStore>>;

pub fn create_shared_cache(capacity: usize, ttl: Duration) -> SharedClassificationCache {
    Arc::new(Mutex::new(ClassificationCacheStore::new(capacity, ttl)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, ProcessingTier};

    fn sample_result() -> ClassificationResult {
        ClassificationResult {
            classification: Classification::Business,
            confidence: 90,
            reasoning: "test".to_string(),
            tier: ProcessingTier::RuleBased,
            matching_rules: vec![],
        }
    }

    #[test]
    fn test_put_get_round_trip() {
        let mut store = ClassificationCacheStore::new(10, Duration::from_secs(60));
        store.put("acme inc".to_string(), sample_result());
        let hit = store.get("acme inc").unwrap();
        assert_eq!(hit.confidence, 90);
        assert_eq!(store.hits, 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let mut store = ClassificationCacheStore::new(10, Duration::from_millis(0));
        store.put("acme inc".to_string(), sample_result());
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get("acme inc").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_bounded_eviction() {
        let mut store = ClassificationCacheStore::new(2, Duration::from_secs(60));
        store.put("a".to_string(), sample_result());
        store.put("b".to_string(), sample_result());
        store.put("c".to_string(), sample_result());
        assert_eq!(store.len(), 2);
        assert!(store.get("a").is_none());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_snapshot_filters_expired() {
        let mut store = ClassificationCacheStore::new(10, Duration::from_secs(60));
        store.put("a".to_string(), sample_result());
        assert_eq!(store.snapshot().len(), 1);
    }
}
