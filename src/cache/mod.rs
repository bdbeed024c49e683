//! In-memory enumeration cache.
//!
//! Memoizes live enumeration lookups across introspection calls. Entries are
//! keyed by a hash of (endpoint, variable, sub-query) and expire after a TTL.
//! Stale entries are swept on every insert.
//!
//! # Key Format
//!
//! ```text
//! sha256(len(endpoint) endpoint len(variable) variable len(query) query)
//! ```

mod hash;
pub use hash::{enumeration_key, hash_parts};

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::EnumerationSettings;

#[derive(Debug, Clone)]
struct CachedValues {
    values: Vec<String>,
    stored_at: Instant,
}

/// Concurrent TTL cache of enumeration values.
#[derive(Debug)]
pub struct EnumerationCache {
    entries: DashMap<String, CachedValues>,
    ttl: Duration,
}

impl EnumerationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Build a cache from settings, or `None` when caching is disabled.
    pub fn from_settings(settings: &EnumerationSettings) -> Option<Self> {
        settings
            .cache_enabled
            .then(|| Self::new(Duration::from_secs(settings.cache_ttl_seconds)))
    }

    /// Cached values for `key`, if present and fresh. Expired entries are evicted.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let fresh = {
            let entry = self.entries.get(key)?;
            (entry.stored_at.elapsed() < self.ttl).then(|| entry.values.clone())
        };
        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    /// Store `values` under `key`, sweeping out every expired entry first.
    pub fn insert(&self, key: String, values: Vec<String>) {
        self.evict_expired();
        self.entries.insert(
            key,
            CachedValues {
                values,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop all entries older than the TTL.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
