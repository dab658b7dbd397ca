//! Common utilities shared across utilkit crates.
//!
//! The centrepiece is [`ExpiringCache`], a concurrent key/value cache whose
//! entries are swept away by a background thread once their time-to-live has
//! elapsed.
//!
//! # Feature Flags
//!
//! - `serde` (default): `Serialize`/`Deserialize` for [`CacheConfig`] and the
//!   [`duration_millis`] adapter

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod cache;
pub mod error;
pub mod time;
pub mod utils;

// Re-export commonly used types for convenience
pub use cache::{CacheConfig, CacheConfigBuilder, CacheStats, ExpiringCache};
pub use error::{CacheError, CacheResult};
pub use time::{Clock, MockClock, SystemClock};
#[cfg(feature = "serde")]
pub use utils::duration_millis;
