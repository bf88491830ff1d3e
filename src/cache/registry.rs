//! Cache registry - Central management for named caches.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::{BoundedCache, CacheConfig};

/// Central registry for managing multiple bounded caches.
///
/// Components create and access their own caches by name, typically
/// one per session or per memoized lookup.
///
/// ## Example
///
/// ```rust
/// use core_utils::cache::{BoundedCache, CacheConfig, CacheRegistry};
///
/// let registry = CacheRegistry::new();
///
/// let ids: BoundedCache<String, u64> = registry.create("ids", CacheConfig::default());
/// ids.set("alice".to_string(), 1);
///
/// // Later, retrieve the same cache
/// let ids: BoundedCache<String, u64> = registry.get("ids").unwrap();
/// assert_eq!(ids.get(&"alice".to_string()), Some(1));
/// ```
#[derive(Clone)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, RegistryEntry>>>,
}

/// Internal registry entry storing a type-erased cache.
struct RegistryEntry {
    cache: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl RegistryEntry {
    fn downcast<K, V>(&self, name: &str) -> BoundedCache<K, V>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        match self.cache.downcast_ref::<BoundedCache<K, V>>() {
            Some(cache) if self.type_id == TypeId::of::<BoundedCache<K, V>>() => cache.clone(),
            _ => panic!(
                "Cache '{}' type mismatch: expected {}, got {}",
                name,
                std::any::type_name::<BoundedCache<K, V>>(),
                self.type_name
            ),
        }
    }
}

impl CacheRegistry {
    /// Create a new empty cache registry.
    pub fn new() -> Self {
        info!("Cache registry initialized");
        Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a named cache, or return the existing one.
    ///
    /// Repeat calls with the same name return the same shared instance;
    /// `config` is only used by the first call.
    ///
    /// # Panics
    /// Panics if a cache with the same name but different types already exists,
    /// or if `config.max_size` is zero.
    pub fn create<K, V>(&self, name: &str, config: CacheConfig) -> BoundedCache<K, V>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.write();

        if let Some(existing) = caches.get(name) {
            return existing.downcast(name);
        }

        debug!("Creating cache: {}", name);
        let cache = BoundedCache::new(name, config);

        caches.insert(
            name.to_string(),
            RegistryEntry {
                cache: Box::new(cache.clone()),
                type_id: TypeId::of::<BoundedCache<K, V>>(),
                type_name: std::any::type_name::<BoundedCache<K, V>>(),
            },
        );

        cache
    }

    /// Get an existing cache by name.
    ///
    /// Returns `None` if the cache doesn't exist.
    ///
    /// # Panics
    /// Panics if the cache exists but with different types.
    pub fn get<K, V>(&self, name: &str) -> Option<BoundedCache<K, V>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        self.caches
            .read()
            .get(name)
            .map(|entry| entry.downcast(name))
    }

    /// Check if a cache with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    /// Remove a cache from the registry.
    ///
    /// Returns `true` if the cache existed. Handles already held by callers
    /// keep working but are no longer reachable by name.
    pub fn delete(&self, name: &str) -> bool {
        let removed = self.caches.write().remove(name).is_some();
        if removed {
            debug!("Removed cache: {}", name);
        }
        removed
    }

    /// Get the number of registered caches.
    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    /// Get a list of all registered cache names, sorted.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every registered cache.
    pub fn reset_for_tests(&self) {
        self.caches.write().clear();
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}

static GLOBAL_CACHE_REGISTRY: Lazy<CacheRegistry> = Lazy::new(CacheRegistry::new);

/// Process-wide default registry.
///
/// Prefer passing a [`CacheRegistry`] explicitly (see [`crate::Services`]);
/// this accessor exists for call sites without one.
pub fn global_cache_registry() -> &'static CacheRegistry {
    &GLOBAL_CACHE_REGISTRY
}
