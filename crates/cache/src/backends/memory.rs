//! In-memory durable store and shared cache

use crate::traits::{DurableStore, SharedCache};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use noticeboard_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Counters of the operations a [`MemoryStore`] has served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub gets: u64,
    pub scans: u64,
    pub writes: u64,
    pub deletes: u64,
}

/// Durable store kept in process memory
///
/// Keys are ordered so that prefix scans are a range walk. Every operation
/// is counted, which lets tests assert how many round trips a code path
/// costs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    gets: AtomicU64,
    scans: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            gets: self.gets.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    /// Make every subsequent `set` fail, simulating a persistence outage
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw view of the stored keys, for assertions
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::store("set", key, "store is unavailable"));
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    expires_at: Instant,
}

impl CachedValue {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Shared cache kept in process memory
///
/// TTLs follow `tokio::time`, so tests can pause and advance the clock.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CachedValue>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.is_live())
    }
}

#[async_trait]
impl SharedCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let live = self
            .entries
            .get(key)
            .map(|entry| entry.is_live().then(|| entry.value.clone()));
        match live {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.entries.remove_if(key, |_, entry| !entry.is_live());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), CachedValue::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live()))
    }

    async fn add_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        // The entry guard holds the shard lock across check and insert
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live() {
                    Ok(false)
                } else {
                    occupied.insert(CachedValue::new(value, ttl));
                    Ok(true)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CachedValue::new(value, ttl));
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_scan_is_prefix_bounded() {
        let store = MemoryStore::new();
        store.set("admin_notice_1_message", "a").await.unwrap();
        store.set("admin_notice_2_type", "info").await.unwrap();
        store.set("admin_noticeboard", "x").await.unwrap();
        store.set("zzz", "y").await.unwrap();

        let found = store.scan_prefix("admin_notice_").await.unwrap();
        let keys: Vec<_> = found.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["admin_notice_1_message", "admin_notice_2_type"]);
        assert_eq!(store.stats().scans, 1);
    }

    #[tokio::test]
    async fn test_store_write_failure() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let err = store.set("k", "v").await.unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_entries_expire() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.delete("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_if_absent_respects_live_entries() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(5);

        assert!(cache.add_if_absent("lock", "a", ttl).await.unwrap());
        assert!(!cache.add_if_absent("lock", "b", ttl).await.unwrap());
        assert_eq!(cache.get("lock").await.unwrap().as_deref(), Some("a"));

        // An abandoned lock becomes claimable once its TTL passes
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.add_if_absent("lock", "c", ttl).await.unwrap());
        assert_eq!(cache.get("lock").await.unwrap().as_deref(), Some("c"));
    }
}
