//! Error type for cache operations.

/// Errors raised by the cache layer.
///
/// Only [`CacheError::Configuration`] ever escapes to the caller, and only at
/// setup time. Everything else is logged and turned into "no caching".
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid cache configuration: {0}")]
    Configuration(String),

    #[error("Failed to capture body for storage: {0}")]
    Serialization(String),
}
