//! In-memory dimension cache with LRU eviction
//!
//! Memoizes resolved image dimensions so repeated lookups for the same image
//! never hit the platform probe again. The cache holds a fixed number of
//! entries; inserting a new key at capacity evicts the least recently used
//! entry in the same critical section, so no caller can observe it over
//! capacity.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use crate::config::CacheConfig;
use crate::dimensions::Dimensions;

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently in cache
    pub entry_count: usize,

    /// Maximum number of entries
    pub capacity: usize,

    /// Number of cache hits
    pub hits: u64,

    /// Number of cache misses
    pub misses: u64,

    /// Number of entries evicted to make room for new keys
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Internal cache state
struct CacheState {
    /// Key to dimensions, ordered by recency (front is most recently used)
    entries: LruCache<String, Dimensions>,

    stats: CacheStats,
}

impl CacheState {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats {
                capacity: capacity.get(),
                ..Default::default()
            },
        }
    }

    fn sync_count(&mut self) {
        self.stats.entry_count = self.entries.len();
    }
}

/// Shared dimension cache with LRU eviction
///
/// Cloning the handle shares the underlying storage, so one instance can be
/// created at startup and handed to every resolver that should see the same
/// memoized results.
///
/// # Example
///
/// ```
/// use lightbox_cache::{DimensionCache, Dimensions};
///
/// let cache = DimensionCache::new(2);
/// cache.set("a", Dimensions::new(640, 480));
/// cache.set("b", Dimensions::new(800, 600));
///
/// // Reading "a" makes "b" the least recently used entry
/// assert_eq!(cache.get("a"), Some(Dimensions::new(640, 480)));
/// cache.set("c", Dimensions::new(10, 10));
///
/// assert!(cache.contains("a"));
/// assert!(!cache.contains("b"));
/// assert_eq!(cache.len(), 2);
/// ```
#[derive(Clone)]
pub struct DimensionCache {
    state: Arc<Mutex<CacheState>>,
}

impl DimensionCache {
    /// Create a cache holding at most `capacity` entries
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(Mutex::new(CacheState::new(capacity))),
        }
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Every mutation leaves the state consistent, so a poisoned lock is
        // still safe to use.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up the dimensions stored under `key`
    ///
    /// A hit counts as a use and moves the entry to the most recently used
    /// position.
    pub fn get(&self, key: &str) -> Option<Dimensions> {
        let mut state = self.lock();

        match state.entries.get(key).copied() {
            Some(dimensions) => {
                state.stats.hits += 1;
                tracing::trace!(key, %dimensions, "dimension cache hit");
                Some(dimensions)
            }
            None => {
                state.stats.misses += 1;
                tracing::trace!(key, "dimension cache miss");
                None
            }
        }
    }

    /// Store dimensions under `key`
    ///
    /// Overwriting an existing key refreshes its recency without growing the
    /// cache. Inserting a new key at capacity evicts the least recently used
    /// entry first.
    pub fn set(&self, key: impl Into<String>, dimensions: Dimensions) {
        let key = key.into();
        let mut state = self.lock();

        if let Some((displaced, _)) = state.entries.push(key.clone(), dimensions) {
            if displaced != key {
                state.stats.evictions += 1;
                tracing::trace!(evicted = %displaced, "dimension cache eviction");
            }
        }

        state.sync_count();
    }

    /// Look up an entry without updating its recency or the hit counters
    pub fn peek(&self, key: &str) -> Option<Dimensions> {
        self.lock().entries.peek(key).copied()
    }

    /// Check if a key is cached without updating its recency
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains(key)
    }

    /// Keys from most to least recently used
    pub fn keys_mru(&self) -> Vec<String> {
        self.lock()
            .entries
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

impl Default for DimensionCache {
    /// Create a cache with the default capacity of 50 entries
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}
