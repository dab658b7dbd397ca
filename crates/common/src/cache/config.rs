//! Cache configuration types and builder
//!
//! A [`CacheConfig`] fixes the time-to-live for the lifetime of a cache. The
//! ttl doubles as the sweeper period, so there is no separate interval knob.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Thread name used for the background sweeper unless overridden.
pub const DEFAULT_SWEEPER_THREAD_NAME: &str = "cache-sweeper";

/// Configuration for an [`ExpiringCache`](super::ExpiringCache)
///
/// With the `serde` feature the struct can be embedded in a service's own
/// config file; `ttl` is written as milliseconds and every field is optional.
///
/// ```
/// # #[cfg(feature = "serde")]
/// # {
/// use std::time::Duration;
///
/// use utilkit_common::cache::CacheConfig;
///
/// let config: CacheConfig = serde_json::from_str(r#"{"ttl": 30000}"#).unwrap();
/// assert_eq!(config.ttl, Duration::from_secs(30));
/// assert!(!config.track_metrics);
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheConfig {
    /// Entry lifetime and sweep period. `Duration::ZERO` disables expiry.
    #[cfg_attr(feature = "serde", serde(with = "crate::utils::duration_millis"))]
    pub ttl: Duration,

    /// Whether to collect hit/miss/sweep counters
    pub track_metrics: bool,

    /// Name given to the sweeper OS thread
    pub sweeper_thread_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::ZERO,
            track_metrics: false,
            sweeper_thread_name: DEFAULT_SWEEPER_THREAD_NAME.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Preset for a cache whose entries expire after `ttl`
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    ///
    /// use utilkit_common::cache::CacheConfig;
    ///
    /// let config = CacheConfig::ttl(Duration::from_secs(60));
    /// assert!(config.expires());
    /// ```
    pub fn ttl(ttl: Duration) -> Self {
        Self { ttl, ..Self::default() }
    }

    /// Preset for a cache that never expires entries on its own
    pub fn no_expiry() -> Self {
        Self::default()
    }

    /// Whether entries expire, i.e. whether a sweeper will run.
    pub fn expires(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Check the configuration before a cache is built from it.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] when the sweeper thread name is
    /// empty or contains a NUL byte.
    pub fn validate(&self) -> CacheResult<()> {
        if self.sweeper_thread_name.trim().is_empty() {
            return Err(CacheError::invalid_config("sweeper_thread_name", "must not be empty"));
        }
        if self.sweeper_thread_name.contains('\0') {
            return Err(CacheError::invalid_config(
                "sweeper_thread_name",
                "must not contain NUL bytes",
            ));
        }
        Ok(())
    }
}

/// Builder for [`CacheConfig`] with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry lifetime (and sweep period)
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Enable or disable metrics tracking
    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    /// Set the sweeper thread name
    pub fn sweeper_thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.sweeper_thread_name = name.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
