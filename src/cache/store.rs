//! Cache Store Module
//!
//! Key-value map with a single TTL applied to every entry.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::CacheEntry;

// == Cache Store ==
/// TTL cache keyed by string.
///
/// Reads check expiry themselves, so a stale entry is never returned even if
/// the background sweep has not removed it yet. The store itself is not
/// synchronized; share it as `Arc<RwLock<CacheStore<V>>>`.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Lifetime given to every entry on `set`
    ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    // == Set ==
    /// Stores a value, unconditionally replacing any previous entry and
    /// resetting its expiration to now + TTL.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries
            .insert(key.into(), CacheEntry::new(value, self.ttl));
    }

    // == Get ==
    /// Returns a clone of the value if present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    // == Invalidate ==
    /// Removes an entry; no-op when absent.
    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    // == TTL ==
    /// The configured entry lifetime, also used as the sweep period.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Length ==
    /// Returns the number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_store_new() {
        let store: CacheStore<String> = CacheStore::new(TTL);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.ttl(), TTL);
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(TTL);

        store.set("songs:list", vec![1, 2, 3]);

        assert_eq!(store.get("songs:list"), Some(vec![1, 2, 3]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store: CacheStore<String> = CacheStore::new(TTL);
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_invalidate() {
        let mut store = CacheStore::new(TTL);

        store.set("key1", "value1".to_string());
        store.invalidate("key1");

        assert!(store.is_empty());
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_store_invalidate_nonexistent_is_noop() {
        let mut store = CacheStore::new(TTL);
        store.set("key1", "value1".to_string());

        store.invalidate("other");

        assert_eq!(store.get("key1").as_deref(), Some("value1"));
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new(TTL);

        store.set("key1", "value1".to_string());
        store.set("key1", "value2".to_string());

        assert_eq!(store.get("key1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_expired_read_is_miss_without_sweep() {
        let mut store = CacheStore::new(Duration::from_secs(1));
        store.set("key1", "value1".to_string());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(store.get("key1").is_some());

        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(store.get("key1").is_none());
        // Still physically present until a sweep runs
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_overwrite_resets_expiration() {
        let mut store = CacheStore::new(Duration::from_secs(1));
        store.set("key1", 1);

        tokio::time::advance(Duration::from_millis(800)).await;
        store.set("key1", 2);
        tokio::time::advance(Duration::from_millis(800)).await;

        assert_eq!(store.get("key1"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_cleanup_expired() {
        let mut store = CacheStore::new(Duration::from_secs(1));

        store.set("old", "value1".to_string());
        tokio::time::advance(Duration::from_millis(700)).await;
        store.set("new", "value2".to_string());
        tokio::time::advance(Duration::from_millis(400)).await;

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("new").is_some());
    }
}
