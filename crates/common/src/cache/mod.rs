//! Thread-safe key/value cache with time-based expiry
//!
//! [`ExpiringCache`] stores values under hashable keys and stamps each write
//! with the instant it happened. A background sweeper thread wakes once per
//! ttl and removes entries older than the ttl. Reads never expire anything on
//! their own, so an entry may stay visible for up to one extra sweep period.
//!
//! # Features
//!
//! - **Thread-safe**: one `parking_lot::RwLock` guards the map; handles are
//!   `Clone` and share storage
//! - **Atomic insert-if-absent**: `get_or_insert` under a single exclusive
//!   lock
//! - **Critical sections**: [`ExpiringCache::lock`] and
//!   [`ExpiringCache::read`] for multi-step atomic sequences
//! - **Deterministic sweeps**: [`ExpiringCache::purge_expired`] runs a sweep
//!   on demand
//! - **Metrics tracking**: optional hit/miss/expiration counters
//! - **Testable**: clock abstraction for deterministic time-based testing
//!
//! # Examples
//!
//! ## TTL cache
//! ```
//! use std::time::Duration;
//!
//! use utilkit_common::cache::ExpiringCache;
//!
//! let cache: ExpiringCache<String, String> = ExpiringCache::new(Duration::from_secs(3600))?;
//! cache.insert("session".to_string(), "data".to_string());
//! assert_eq!(cache.get("session").as_deref(), Some("data"));
//! cache.close();
//! # Ok::<(), utilkit_common::error::CacheError>(())
//! ```
//!
//! ## Cache statistics
//! ```
//! use std::time::Duration;
//!
//! use utilkit_common::cache::{CacheConfig, ExpiringCache};
//!
//! let config = CacheConfig::builder().ttl(Duration::from_secs(60)).track_metrics(true).build();
//! let cache: ExpiringCache<String, i32> = ExpiringCache::with_config(config)?;
//!
//! cache.insert("key1".to_string(), 1);
//! let _ = cache.get("key1");
//!
//! let stats = cache.stats();
//! println!("Hit rate: {:.2}%", stats.hit_rate() * 100.0);
//! # Ok::<(), utilkit_common::error::CacheError>(())
//! ```
//!
//! # Lifecycle
//!
//! With a non-zero ttl the constructor starts a named OS thread. It is
//! stopped and joined by [`ExpiringCache::close`], or automatically once the
//! last handle is dropped. A zero ttl disables expiry and starts no thread.

mod config;
mod core;
mod guard;
mod stats;
mod sweeper;

// Re-export public API
pub use self::core::ExpiringCache;
pub use config::{CacheConfig, CacheConfigBuilder, DEFAULT_SWEEPER_THREAD_NAME};
pub use guard::{CacheReadGuard, CacheWriteGuard};
pub use stats::CacheStats;
