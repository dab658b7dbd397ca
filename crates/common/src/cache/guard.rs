//! Lock guards for multi-step critical sections
//!
//! [`CacheWriteGuard`] and [`CacheReadGuard`] expose the cache operations
//! against an already-held lock. Because the guard borrows the locked map,
//! `get` can hand out references instead of clones.
//!
//! Neither lock is reentrant. While a guard is alive, the owning thread must
//! only go through the guard; calling the cache (or any clone of it) directly
//! deadlocks.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::core::{Shared, Storage};
use crate::time::Clock;

/// Exclusive access to a cache, released on drop
pub struct CacheWriteGuard<'a, K, V, C> {
    shared: &'a Shared<K, V, C>,
    storage: RwLockWriteGuard<'a, Storage<K, V>>,
}

impl<'a, K, V, C> CacheWriteGuard<'a, K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    pub(super) fn new(
        shared: &'a Shared<K, V, C>,
        storage: RwLockWriteGuard<'a, Storage<K, V>>,
    ) -> Self {
        Self { shared, storage }
    }

    /// Borrow the value under `key`. Expiry is not checked.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.storage.get(key);
        self.shared.record_lookup(value.is_some());
        value
    }

    /// Whether `key` is present, expired-but-unswept entries included.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// Insert or overwrite `key`, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.storage.insert(key, value, self.shared.clock.now());
        if let Some(metrics) = self.shared.metrics() {
            metrics.record_insert();
        }
        previous
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.storage.remove(key);
        if removed.is_some() {
            if let Some(metrics) = self.shared.metrics() {
                metrics.record_removal();
            }
        }
        removed
    }

    /// Borrow the existing value, or store `value` and borrow that.
    pub fn get_or_insert(&mut self, key: K, value: V) -> &V {
        self.get_or_insert_with(key, || value)
    }

    /// Borrow the existing value, or store `make()` and borrow that.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &V
    where
        F: FnOnce() -> V,
    {
        let now = self.shared.clock.now();
        let shared = self.shared;
        let (value, inserted) = self.storage.get_or_insert_with(key, now, make);

        shared.record_lookup(!inserted);
        if inserted {
            if let Some(metrics) = shared.metrics() {
                metrics.record_insert();
            }
        }
        value
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        let dropped = self.storage.clear();
        if let Some(metrics) = self.shared.metrics() {
            metrics.record_clear();
        }
        debug!(dropped, "cache cleared");
    }

    /// Sweep expired entries inside this critical section.
    pub fn purge_expired(&mut self) -> usize {
        let removed = self.storage.purge_expired(self.shared.clock.now(), self.shared.ttl);
        self.shared.finish_sweep(removed, self.storage.len());
        removed
    }

    /// Iterate over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.storage.iter()
    }
}

impl<K, V, C> fmt::Debug for CacheWriteGuard<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheWriteGuard").field("ttl", &self.shared.ttl).finish_non_exhaustive()
    }
}

/// Shared read access to a cache, released on drop
///
/// Multiple read guards may be held at once. Writers and the sweeper wait
/// until all of them are dropped.
pub struct CacheReadGuard<'a, K, V, C> {
    shared: &'a Shared<K, V, C>,
    storage: RwLockReadGuard<'a, Storage<K, V>>,
}

impl<'a, K, V, C> CacheReadGuard<'a, K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    pub(super) fn new(
        shared: &'a Shared<K, V, C>,
        storage: RwLockReadGuard<'a, Storage<K, V>>,
    ) -> Self {
        Self { shared, storage }
    }

    /// Borrow the value under `key`. Expiry is not checked.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.storage.get(key);
        self.shared.record_lookup(value.is_some());
        value
    }

    /// Whether `key` is present, expired-but-unswept entries included.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// Iterate over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.storage.iter()
    }
}

impl<K, V, C> fmt::Debug for CacheReadGuard<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheReadGuard").field("ttl", &self.shared.ttl).finish_non_exhaustive()
    }
}
