//! # TTL Result Cache
//!
//! LRU-bounded map from cache key to a method result with an expiry.
//! Lookups return [`CacheLookup::Miss`] for absent and expired entries; the
//! dispatcher then runs the handler and stores its result.

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(Value),
    /// Absent or expired; compute and populate.
    Miss,
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

pub struct TtlCache {
    entries: Mutex<LruCache<String, Entry>>,
}

impl TtlCache {
    /// Cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, key: &str) -> CacheLookup {
        let mut entries = self.entries.lock();
        let fresh = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => None,
            None => return CacheLookup::Miss,
        };
        match fresh {
            Some(value) => CacheLookup::Hit(value),
            None => {
                entries.pop(key);
                CacheLookup::Miss
            }
        }
    }

    pub fn put(&self, key: String, value: Value, ttl: Duration) {
        self.entries.lock().put(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry whose key belongs to `network`.
    pub fn invalidate_network(&self, network: &str) {
        let prefix = format!("{network}/");
        let mut entries = self.entries.lock();
        let stale: Vec<String> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in stale {
            entries.pop(&key);
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
