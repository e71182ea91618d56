//! Time-expiring memoization of completion results.
//!
//! Entries are keyed on the resolved prompt template plus the truncated
//! document text, so the same email analyzed with an overlapping set of
//! insight kinds reuses the overlapping results. There is no size bound.

use moka::future::Cache as MokaCache;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Hash of `(template, content)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(template: &str, content: &str) -> Self {
        let mut hasher = Sha256::new();
        // Length prefix keeps ("ab", "c") and ("a", "bc") apart.
        hasher.update((template.len() as u64).to_le_bytes());
        hasher.update(template.as_bytes());
        hasher.update(content.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Shared completion cache with a fixed freshness window.
pub struct InsightCache {
    ttl: Duration,
    entries: MokaCache<CacheKey, String>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InsightCache {
    pub fn new(ttl: Duration) -> Self {
        let entries = MokaCache::builder().time_to_live(ttl).build();
        Self {
            ttl,
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached text if present and still fresh.
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        match self.entries.get(key).await {
            Some(text) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit {}", &key.as_str()[..12]);
                Some(text)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a complete result. Replaces any previous entry for `key`.
    pub async fn insert(&self, key: CacheKey, text: String) {
        self.entries.insert(key, text).await;
    }

    /// Evicts expired entries now instead of on the next maintenance pass.
    pub async fn purge_expired(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Number of live entries.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
