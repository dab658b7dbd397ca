//! Small shared helpers
//!
//! - **[`serde`]**: serde adapters for configuration types

#[cfg(feature = "serde")]
pub mod serde;

#[cfg(feature = "serde")]
pub use self::serde::duration_millis;
