//! Error types for cache construction
//!
//! Cache operations themselves never fail: a missing key is `None`, not an
//! error. The only failures happen while building a cache, either because the
//! configuration is invalid or because the OS refused to start the sweeper
//! thread.

use thiserror::Error;

/// Result type for fallible cache construction.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised while constructing an [`ExpiringCache`](crate::cache::ExpiringCache).
#[derive(Debug, Error)]
pub enum CacheError {
    /// A configuration field failed validation.
    #[error("Invalid cache configuration in field '{field}': {message}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The background sweeper thread could not be spawned.
    #[error("Failed to spawn cache sweeper thread: {0}")]
    SweeperSpawn(#[source] std::io::Error),
}

impl CacheError {
    /// Build an [`CacheError::InvalidConfig`] error.
    pub fn invalid_config<M: Into<String>>(field: &'static str, message: M) -> Self {
        Self::InvalidConfig { field, message: message.into() }
    }

    /// Whether retrying the same construction could succeed.
    ///
    /// Thread spawn failures are usually transient resource exhaustion; a bad
    /// configuration stays bad.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidConfig { .. } => false,
            Self::SweeperSpawn(_) => true,
        }
    }
}
