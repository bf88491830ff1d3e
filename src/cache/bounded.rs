//! Bounded in-process cache with FIFO eviction and TTL expiry.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

use super::{CacheConfig, Clock, SystemClock};

/// A single cached value.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Point-in-time counters for a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
    pub max_size: usize,
}

/// Mutable state guarded by the cache lock.
struct CacheState<K, V> {
    /// Entries in insertion order, oldest at index 0.
    entries: IndexMap<K, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<K, V> CacheState<K, V>
where
    K: Hash + Eq,
{
    fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Remove an entry, keeping the relative order of the rest.
    fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.shift_remove(key)
    }

    /// Drop every expired entry, returning how many were removed.
    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        self.expirations += removed as u64;
        removed
    }

    fn evict_oldest(&mut self) {
        if self.entries.shift_remove_index(0).is_some() {
            self.evictions += 1;
        }
    }
}

/// Absolute expiry for a TTL starting at `now`.
///
/// A TTL too large to represent never expires.
fn expiry(now: Instant, ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| now.checked_add(ttl))
}

/// A bounded key/value cache.
///
/// This cache is:
/// - Thread-safe (one lock around the entry table)
/// - FIFO-evicting: at capacity, the oldest *inserted* entry goes first.
///   Overwriting a live key keeps its original position.
/// - TTL-aware: expired entries are treated as absent and removed lazily
/// - Clone-friendly (cloning is cheap, shares the same underlying cache)
pub struct BoundedCache<K, V> {
    state: Arc<Mutex<CacheState<K, V>>>,
    clock: Arc<dyn Clock>,
    name: Arc<str>,
    max_size: usize,
    default_ttl: Option<Duration>,
}

// Manual Clone implementation that doesn't require K: Clone, V: Clone
impl<K, V> Clone for BoundedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
            name: Arc::clone(&self.name),
            max_size: self.max_size,
            default_ttl: self.default_ttl,
        }
    }
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Create a new cache with the given name and config.
    ///
    /// # Panics
    /// Panics if `config.max_size` is zero.
    pub fn new(name: impl Into<Arc<str>>, config: CacheConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Create a new cache that reads time from `clock`.
    ///
    /// # Panics
    /// Panics if `config.max_size` is zero.
    pub fn with_clock(
        name: impl Into<Arc<str>>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let name = name.into();
        assert!(
            config.max_size > 0,
            "Cache '{}' must have a max_size greater than zero",
            name
        );

        Self {
            state: Arc::new(Mutex::new(CacheState::new())),
            clock,
            name,
            max_size: config.max_size,
            default_ttl: config.default_ttl,
        }
    }

    /// Get the name of this cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of live entries.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// TTL applied by [`set`](Self::set).
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Insert or overwrite a value using the cache's default TTL.
    pub fn set(&self, key: K, value: V) {
        self.set_entry(key, value, self.default_ttl);
    }

    /// Insert or overwrite a value with an explicit TTL.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.set_entry(key, value, Some(ttl));
    }

    fn set_entry(&self, key: K, value: V, ttl: Option<Duration>) {
        let now = self.clock.now();
        let expires_at = expiry(now, ttl);
        let mut state = self.state.lock();

        match state.entries.get_mut(&key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.value = value;
                entry.expires_at = expires_at;
                return;
            }
            Some(_) => {
                // Expired keys re-enter at the back of the queue
                state.remove(&key);
                state.expirations += 1;
            }
            None => {}
        }

        if state.entries.len() >= self.max_size {
            state.purge_expired(now);
        }
        if state.entries.len() >= self.max_size {
            state.evict_oldest();
            trace!("Cache '{}' at capacity, evicted oldest entry", self.name);
        }

        state.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Get a value from the cache.
    ///
    /// Returns `Some(value)` if the key exists and hasn't expired.
    /// An expired entry is removed as a side effect.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            state.remove(key);
            state.expirations += 1;
            state.misses += 1;
            return None;
        }

        state.hits += 1;
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Check if a live entry exists for the key.
    pub fn has(&self, key: &K) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => return false,
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            state.remove(key);
            state.expirations += 1;
        }
        !expired
    }

    /// Remove a key from the cache.
    ///
    /// Returns `true` if a live entry was removed.
    pub fn delete(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.state
            .lock()
            .remove(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remove all entries from the cache.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Number of live entries. Expired entries are swept first.
    pub fn size(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.purge_expired(now);
        state.entries.len()
    }

    /// Whether the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Live keys, oldest inserted first.
    pub fn keys(&self) -> Vec<K> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.purge_expired(now);
        state.entries.keys().cloned().collect()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.purge_expired(now);
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
            size: state.entries.len(),
            max_size: self.max_size,
        }
    }
}

impl<K, V> std::fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("name", &self.name)
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("entry_count", &self.state.lock().entries.len())
            .finish()
    }
}
