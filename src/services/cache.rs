use dashmap::DashMap;
use chrono::NaiveDate;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Identity of a computed report: the same symbol over the same window on
/// the same trading day always yields the same rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub symbol: String,
    pub window: String,
    pub as_of: NaiveDate,
}

impl ReportKey {
    pub fn new(symbol: impl Into<String>, window: impl Into<String>, as_of: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            window: window.into(),
            as_of,
        }
    }
}

/// A thread-safe cache with TTL support. Values are never mutated once
/// inserted; a repeat insert replaces the entry.
pub struct Cache<K, V> {
    data: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<K: Eq + Hash, V: Clone> Cache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            ttl,
        }
    }

    /// Get a live value, evicting it if expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remove all expired entries.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.data.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of entries, including expired ones not yet cleaned up.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
