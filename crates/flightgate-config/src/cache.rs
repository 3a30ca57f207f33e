//! Response cache configuration.
//!
//! # Environment Variables
//!
//! - `SEARCH_CACHE_TTL_SECONDS`: TTL for flight search responses (default: 300)
//! - `HELLO_CACHE_TTL_SECONDS`: TTL for the `/hello` probe (default: 60)
//! - `CACHE_SWEEP_INTERVAL_SECONDS`: how often expired entries are reclaimed (default: 30, `0` disables)
//! - `CACHE_MAX_BODY_BYTES`: largest request body read to derive a cache key (default: 2 MiB)
//!
//! TTLs are parsed as seconds and may be fractional. Whether a TTL is positive
//! is checked when the store is built, not here.

use crate::error::{ConfigError, parse_var};

/// Cache TTLs, one per cached route group.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheConfig {
    /// Seconds a flight search response stays fresh.
    pub search_ttl_seconds: f64,

    /// Seconds a `/hello` response stays fresh.
    pub hello_ttl_seconds: f64,

    /// Seconds between background sweeps of expired entries.
    pub sweep_interval_seconds: u64,

    /// Largest request body, in bytes, buffered to derive a cache key.
    pub max_body_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_seconds: 300.0,
            hello_ttl_seconds: 60.0,
            sweep_interval_seconds: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but not numeric.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            search_ttl_seconds: parse_var(
                &lookup,
                "SEARCH_CACHE_TTL_SECONDS",
                "a number of seconds",
                defaults.search_ttl_seconds,
            )?,
            hello_ttl_seconds: parse_var(
                &lookup,
                "HELLO_CACHE_TTL_SECONDS",
                "a number of seconds",
                defaults.hello_ttl_seconds,
            )?,
            sweep_interval_seconds: parse_var(
                &lookup,
                "CACHE_SWEEP_INTERVAL_SECONDS",
                "a whole number of seconds",
                defaults.sweep_interval_seconds,
            )?,
            max_body_bytes: parse_var(
                &lookup,
                "CACHE_MAX_BODY_BYTES",
                "a whole number of bytes",
                defaults.max_body_bytes,
            )?,
        })
    }
}
