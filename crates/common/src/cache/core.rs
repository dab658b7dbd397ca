//! Expiring key/value cache with lazy, sweep-only expiry
//!
//! Every entry carries the instant it was last written. Reads never look at
//! that timestamp: `get`, `contains` and `len` can observe an entry whose ttl
//! has elapsed until the next sweep removes it. Expiry is enforced only by
//! [`ExpiringCache::purge_expired`], which the background sweeper calls once
//! per ttl. Callers needing strict expiry call `purge_expired` first, or
//! accept staleness of up to one sweep period.

use std::borrow::Borrow;
use std::collections::hash_map::{self, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::config::CacheConfig;
use super::guard::{CacheReadGuard, CacheWriteGuard};
use super::stats::{CacheStats, MetricsCollector};
use super::sweeper::Sweeper;
use crate::error::CacheResult;
use crate::time::{Clock, SystemClock};

/// Value plus the instant it was last written
#[derive(Debug, Clone)]
pub(super) struct CacheEntry<V> {
    pub(super) value: V,
    pub(super) inserted_at: Instant,
}

/// The key/value mapping guarded by the cache lock
#[derive(Debug)]
pub(super) struct Storage<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> Storage<K, V> {
    fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V> Storage<K, V>
where
    K: Eq + Hash,
{
    pub(super) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, entry)| (key, &entry.value))
    }

    /// Overwrite-or-insert, restarting the entry's age.
    pub(super) fn insert(&mut self, key: K, value: V, now: Instant) -> Option<V> {
        self.entries.insert(key, CacheEntry { value, inserted_at: now }).map(|old| old.value)
    }

    pub(super) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Return the existing value, or insert `make()` stamped with `now`.
    ///
    /// The flag is `true` when a new entry was inserted.
    pub(super) fn get_or_insert_with<F>(&mut self, key: K, now: Instant, make: F) -> (&V, bool)
    where
        F: FnOnce() -> V,
    {
        match self.entries.entry(key) {
            hash_map::Entry::Occupied(occupied) => (&occupied.into_mut().value, false),
            hash_map::Entry::Vacant(vacant) => {
                let entry = vacant.insert(CacheEntry { value: make(), inserted_at: now });
                (&entry.value, true)
            }
        }
    }

    /// Swap in an empty map and return how many entries were dropped.
    pub(super) fn clear(&mut self) -> usize {
        std::mem::take(&mut self.entries).len()
    }

    /// Remove entries whose age strictly exceeds `ttl`.
    pub(super) fn purge_expired(&mut self, now: Instant, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now.saturating_duration_since(entry.inserted_at) <= ttl);
        before - self.entries.len()
    }
}

/// State shared by every handle of one cache and, weakly, by its sweeper
pub(super) struct Shared<K, V, C> {
    pub(super) storage: RwLock<Storage<K, V>>,
    pub(super) ttl: Duration,
    pub(super) clock: C,
    metrics: MetricsCollector,
    track_metrics: bool,
}

impl<K, V, C> Shared<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    pub(super) fn metrics(&self) -> Option<&MetricsCollector> {
        self.track_metrics.then_some(&self.metrics)
    }

    pub(super) fn record_lookup(&self, hit: bool) {
        if let Some(metrics) = self.metrics() {
            metrics.record_lookup(hit);
        }
    }

    /// Book-keeping after a sweep ran under the write lock.
    pub(super) fn finish_sweep(&self, removed: usize, remaining: usize) {
        if let Some(metrics) = self.metrics() {
            metrics.record_sweep(removed);
        }
        if removed > 0 {
            debug!(removed, remaining, ttl = ?self.ttl, "purged expired cache entries");
        }
    }

    fn purge_expired(&self) -> usize {
        let mut storage = self.storage.write();
        let removed = storage.purge_expired(self.clock.now(), self.ttl);
        let remaining = storage.len();
        drop(storage);

        self.finish_sweep(removed, remaining);
        removed
    }
}

/// Thread-safe key/value cache with optional time-based expiry
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash`)
/// - `V`: Value type; methods returning owned values need `V: Clone`
/// - `C`: Clock used to stamp and age entries (defaults to `SystemClock`)
///
/// Handles are cheap to clone and share storage and sweeper. The sweeper is
/// stopped and joined by [`close`](Self::close) or when the last handle is
/// dropped.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use utilkit_common::cache::ExpiringCache;
///
/// let cache: ExpiringCache<String, i32> = ExpiringCache::new(Duration::from_secs(60)).unwrap();
/// cache.insert("key".to_string(), 42);
/// assert_eq!(cache.get("key"), Some(42));
/// assert_eq!(cache.get_or_insert("key".to_string(), 7), 42);
/// ```
pub struct ExpiringCache<K, V, C = SystemClock> {
    shared: Arc<Shared<K, V, C>>,
    sweeper: Option<Arc<Sweeper>>,
}

impl<K, V> ExpiringCache<K, V, SystemClock>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create a cache whose entries expire after `ttl`
    ///
    /// `Duration::ZERO` keeps entries until they are removed explicitly and
    /// starts no sweeper thread.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::SweeperSpawn`](crate::error::CacheError::SweeperSpawn)
    /// if the sweeper thread cannot be started.
    pub fn new(ttl: Duration) -> CacheResult<Self> {
        Self::with_config(CacheConfig::ttl(ttl))
    }

    /// Create a cache from a full configuration using the system clock
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate or the sweeper cannot be started.
    pub fn with_config(config: CacheConfig) -> CacheResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> ExpiringCache<K, V, C>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    C: Clock + 'static,
{
    /// Create a cache with a custom clock (useful for testing)
    ///
    /// Only entry ages follow `clock`; the sweeper period is real time.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate or the sweeper cannot be started.
    pub fn with_clock(config: CacheConfig, clock: C) -> CacheResult<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            storage: RwLock::new(Storage::new()),
            ttl: config.ttl,
            clock,
            metrics: MetricsCollector::new(),
            track_metrics: config.track_metrics,
        });

        let sweeper = if config.expires() {
            let storage = Arc::downgrade(&shared);
            let sweeper = Sweeper::spawn(&config.sweeper_thread_name, config.ttl, move || {
                storage.upgrade().map(|shared| shared.purge_expired()).is_some()
            })?;
            Some(Arc::new(sweeper))
        } else {
            None
        };

        Ok(Self { shared, sweeper })
    }
}

impl<K, V, C> ExpiringCache<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    /// Insert or overwrite `key`, restarting its age
    ///
    /// Returns the value previously stored under `key`, if any.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut storage = self.shared.storage.write();
        let previous = storage.insert(key, value, self.shared.clock.now());
        drop(storage);

        if let Some(metrics) = self.shared.metrics() {
            metrics.record_insert();
        }
        previous
    }

    /// Apply `f` to the value stored under `key` without cloning it
    ///
    /// Takes the shared lock. Expiry is not checked.
    pub fn get_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        let storage = self.shared.storage.read();
        let result = storage.get(key).map(f);
        drop(storage);

        self.shared.record_lookup(result.is_some());
        result
    }

    /// Whether `key` is present, expired-but-unswept entries included
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_with(key, |_| ()).is_some()
    }

    /// Remove `key`, returning its value if it was present
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.shared.storage.write().remove(key);

        if removed.is_some() {
            if let Some(metrics) = self.shared.metrics() {
                metrics.record_removal();
            }
        }
        removed
    }

    /// Drop every entry
    pub fn clear(&self) {
        let dropped = self.shared.storage.write().clear();

        if let Some(metrics) = self.shared.metrics() {
            metrics.record_clear();
        }
        debug!(dropped, "cache cleared");
    }

    /// Number of entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.shared.storage.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a sweep now
    ///
    /// Removes every entry whose age is strictly greater than the ttl and
    /// returns how many were removed. Works with or without a sweeper; with a
    /// zero ttl it removes every entry that has aged at all.
    pub fn purge_expired(&self) -> usize {
        self.shared.purge_expired()
    }

    /// Configured time-to-live (also the sweep period)
    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    /// Snapshot of the cache counters
    ///
    /// Only `size` is populated unless the cache was built with
    /// `track_metrics`.
    pub fn stats(&self) -> CacheStats {
        let size = self.len();
        self.shared.metrics.snapshot(size)
    }

    /// Whether a background sweeper thread is currently running
    pub fn has_sweeper(&self) -> bool {
        self.sweeper.as_ref().is_some_and(|sweeper| sweeper.is_running())
    }

    /// Stop and join the background sweeper
    ///
    /// Affects every clone of this cache. Entries stay readable and
    /// `purge_expired` keeps working. Concurrent callers all return only after
    /// the thread has exited. Calling it again, or on a cache without a
    /// sweeper, does nothing.
    pub fn close(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }

    /// Take the exclusive lock for a caller-managed critical section
    ///
    /// Every operation on the returned guard runs under one lock acquisition,
    /// so a multi-step sequence is atomic with respect to other callers and
    /// the sweeper.
    ///
    /// # Deadlocks
    ///
    /// The lock is not reentrant. Calling any method of this cache (or a
    /// clone) on the same thread while the guard is alive deadlocks; use the
    /// guard's own methods instead.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use utilkit_common::cache::ExpiringCache;
    ///
    /// let cache: ExpiringCache<&str, u32> = ExpiringCache::new(Duration::ZERO).unwrap();
    /// {
    ///     let mut guard = cache.lock();
    ///     let hits = guard.get("hits").copied().unwrap_or(0);
    ///     guard.insert("hits", hits + 1);
    /// }
    /// assert_eq!(cache.get("hits"), Some(1));
    /// ```
    pub fn lock(&self) -> CacheWriteGuard<'_, K, V, C> {
        CacheWriteGuard::new(&self.shared, self.shared.storage.write())
    }

    /// Take the shared lock for a caller-managed read section
    ///
    /// Other readers may proceed concurrently; writers and the sweeper wait.
    ///
    /// # Deadlocks
    ///
    /// Calling a writing method of this cache on the same thread while the
    /// guard is alive deadlocks. Nested reads can deadlock too when a writer
    /// is queued in between, so do not call `get`/`len` either.
    pub fn read(&self) -> CacheReadGuard<'_, K, V, C> {
        CacheReadGuard::new(&self.shared, self.shared.storage.read())
    }
}

impl<K, V, C> ExpiringCache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    /// Clone of the value stored under `key`
    ///
    /// Takes the shared lock and never checks or enforces expiry.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_with(key, V::clone)
    }

    /// Atomic insert-if-absent
    ///
    /// If `key` is present its value is returned unchanged and `value` is
    /// discarded. Otherwise `value` is stored with a fresh timestamp and
    /// returned. Concurrent callers racing on an absent key all observe the
    /// same winner.
    pub fn get_or_insert(&self, key: K, value: V) -> V {
        self.get_or_insert_with(key, || value)
    }

    /// Like [`get_or_insert`](Self::get_or_insert), building the value lazily
    ///
    /// `make` runs only on a miss and runs while the exclusive lock is held,
    /// so it must not touch this cache.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    ///
    /// use utilkit_common::cache::ExpiringCache;
    ///
    /// let cache: ExpiringCache<String, i32> = ExpiringCache::new(Duration::ZERO).unwrap();
    /// let value = cache.get_or_insert_with("key".to_string(), || 42);
    /// assert_eq!(value, 42);
    /// ```
    pub fn get_or_insert_with<F>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> V,
    {
        let mut storage = self.shared.storage.write();
        let now = self.shared.clock.now();
        let (value, inserted) = storage.get_or_insert_with(key, now, make);
        let value = value.clone();
        drop(storage);

        self.shared.record_lookup(!inserted);
        if inserted {
            if let Some(metrics) = self.shared.metrics() {
                metrics.record_insert();
            }
        }
        value
    }
}

impl<K, V, C> Clone for ExpiringCache<K, V, C> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), sweeper: self.sweeper.clone() }
    }
}

impl<K, V, C> fmt::Debug for ExpiringCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("ttl", &self.shared.ttl)
            .field("len", &self.shared.storage.read().len())
            .field("sweeper_period", &self.sweeper.as_ref().map(|sweeper| sweeper.period()))
            .finish_non_exhaustive()
    }
}
