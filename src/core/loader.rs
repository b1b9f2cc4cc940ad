//! Memoized resource loader
//!
//! Detector models, trace files and similar resources are loaded once per
//! identifier and shared as `Arc<T>`. Failed loads are not remembered, so
//! an explicit retry can succeed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Shared cache of loaded resources keyed by identifier
#[derive(Debug)]
pub struct ResourceCache<T> {
    entries: Mutex<HashMap<String, Arc<T>>>,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceCache<T> {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Return the cached handle for `key`, running `load` on first use.
    ///
    /// The lock is held across `load`, so concurrent callers for the same
    /// cache wait for the first load instead of repeating it.
    pub fn get_or_load<E, F>(&self, key: &str, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = entries.get(key) {
            debug!(key, "resource cache hit");
            return Ok(Arc::clone(hit));
        }
        let value = Arc::new(load()?);
        debug!(key, "resource loaded");
        entries.insert(key.to_string(), Arc::clone(&value));
        Ok(value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Drop a cached entry so the next request reloads it
    pub fn evict(&self, key: &str) -> Option<Arc<T>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_loads_once() {
        let cache: ResourceCache<String> = ResourceCache::new();
        let calls = Cell::new(0);
        let load = || -> Result<String, ()> {
            calls.set(calls.get() + 1);
            Ok("model".to_string())
        };

        let a = cache.get_or_load("face_mesh", load).unwrap();
        let b = cache.get_or_load("face_mesh", load).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_failure_not_cached() {
        let cache: ResourceCache<u32> = ResourceCache::new();
        let first: Result<_, &str> = cache.get_or_load("x", || Err("timeout"));
        assert_eq!(first.unwrap_err(), "timeout");
        assert!(!cache.contains("x"));

        let second: Result<_, &str> = cache.get_or_load("x", || Ok(7));
        assert_eq!(*second.unwrap(), 7);
    }

    #[test]
    fn test_keys_are_independent() {
        let cache: ResourceCache<u32> = ResourceCache::new();
        cache.get_or_load::<(), _>("a", || Ok(1)).unwrap();
        cache.get_or_load::<(), _>("b", || Ok(2)).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(*cache.evict("a").unwrap(), 1);
        assert!(!cache.contains("a"));
    }
}
