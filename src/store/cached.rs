//! LRU caching decorator for population stores.
//!
//! Repeated requests for the same key (common when a service builds many
//! populations at one of the cached sizes) are served from memory instead of
//! re-reading and re-validating the artifact. Failed loads are not cached.

use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::Population;
use super::{LoadError, PopulationKey, PopulationStore};

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
    /// Loads served from the cache.
    pub hits: u64,
    /// Loads forwarded to the inner store.
    pub misses: u64,
}

/// Wraps a store with a bounded LRU of loaded populations.
pub struct LruPopulationStore<S: PopulationStore> {
    inner: S,
    cache: Arc<RwLock<LruCache<PopulationKey, Population>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: PopulationStore> LruPopulationStore<S> {
    /// Wrap `inner`, keeping at most `max_entries` populations (minimum 1).
    pub fn new(inner: S, max_entries: usize) -> Self {
        let size = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Arc::new(RwLock::new(LruCache::new(size))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.read();
        CacheStats {
            len: cache.len(),
            cap: cache.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop all cached populations.
    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

impl<S: PopulationStore> PopulationStore for LruPopulationStore<S> {
    fn load(&self, key: &PopulationKey) -> Result<Population, LoadError> {
        // `get` needs the write lock: a hit moves the entry to the front
        if let Some(population) = self.cache.write().get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key_hash = %key.key_hash(), "Population cache hit");
            return Ok(population.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let population = self.inner.load(key)?;
        self.cache.write().put(key.clone(), population.clone());
        Ok(population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationOptions;
    use crate::store::InMemoryPopulationStore;
    use crate::types::{Location, Person, PersonId, PopulationParams, PopulationSource, Sex};

    fn key(size: usize) -> PopulationKey {
        PopulationKey::new(Location::default(), size, GenerationOptions::default())
    }

    fn make_population(n: u32) -> Population {
        let mut population = Population::new(PopulationParams::new(
            n as usize,
            Location::default(),
            PopulationSource::Synthesized,
        ));
        for i in 0..n {
            population
                .add_person(Person::new(PersonId::new(i), 20, Sex::Female))
                .unwrap();
        }
        population
    }

    fn seeded_store() -> InMemoryPopulationStore {
        let mut store = InMemoryPopulationStore::new();
        store.insert(key(2), make_population(2));
        store.insert(key(3), make_population(3));
        store
    }

    #[test]
    fn test_second_load_is_hit() {
        let store = LruPopulationStore::new(seeded_store(), 4);
        store.load(&key(2)).unwrap();
        let again = store.load(&key(2)).unwrap();

        assert_eq!(again.len(), 2);
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.len, 1);
    }

    #[test]
    fn test_failures_not_cached() {
        let store = LruPopulationStore::new(seeded_store(), 4);
        assert!(store.load(&key(9)).is_err());
        assert!(store.load(&key(9)).is_err());
        assert_eq!(store.stats().misses, 2);
        assert_eq!(store.stats().len, 0);
    }

    #[test]
    fn test_capacity_bounded() {
        let store = LruPopulationStore::new(seeded_store(), 1);
        store.load(&key(2)).unwrap();
        store.load(&key(3)).unwrap();
        assert_eq!(store.stats().len, 1);
        assert_eq!(store.stats().cap, 1);

        store.clear();
        assert_eq!(store.stats().len, 0);
    }

    #[test]
    fn test_hit_refreshes_recency() {
        let mut inner = seeded_store();
        inner.insert(key(4), make_population(4));
        let store = LruPopulationStore::new(inner, 2);

        store.load(&key(2)).unwrap();
        store.load(&key(3)).unwrap();
        store.load(&key(2)).unwrap();
        // Evicts 3, the least recently used
        store.load(&key(4)).unwrap();

        store.load(&key(2)).unwrap();
        assert_eq!(store.stats().hits, 2);
        store.load(&key(3)).unwrap();
        assert_eq!(store.stats().misses, 4);
    }

    #[test]
    fn test_cached_copy_is_independent() {
        let store = LruPopulationStore::new(seeded_store(), 2);
        let mut first = store.load(&key(3)).unwrap();
        first
            .connect(crate::types::Layer::Work, PersonId::new(0), PersonId::new(1))
            .unwrap();

        let second = store.load(&key(3)).unwrap();
        assert_eq!(second.degree(crate::types::Layer::Work, PersonId::new(0)), 0);
    }
}
