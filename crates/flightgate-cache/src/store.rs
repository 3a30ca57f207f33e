//! In-process TTL store.
//!
//! A [`TtlStore`] is created with a single TTL that applies to every entry it
//! holds. Expiry is enforced on read; [`TtlStore::spawn_sweeper`] only reclaims
//! memory held by entries nobody reads again.
//!
//! # Example
//!
//! ```ignore
//! use flightgate_cache::TtlStore;
//! use std::time::Duration;
//!
//! let store: TtlStore<String> = TtlStore::new(Duration::from_secs(300))?;
//! store.set("/hello", "world".to_string());
//! assert_eq!(store.get("/hello").as_deref(), Some("world"));
//! ```

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::CacheError;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= ttl
    }
}

struct Inner<V> {
    entries: DashMap<String, Entry<V>>,
    ttl: Duration,
}

impl<V> Inner<V> {
    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(self.ttl, now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

/// Concurrent key/value store whose entries expire a fixed time after insertion.
///
/// Cloning is cheap and yields a handle to the same entries. Two stores built
/// with separate calls to [`TtlStore::new`] never share entries, even when
/// their TTLs are equal.
pub struct TtlStore<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for TtlStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for TtlStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlStore")
            .field("ttl", &self.inner.ttl)
            .field("entries", &self.inner.entries.len())
            .finish()
    }
}

impl<V> TtlStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty store.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` if `ttl` is zero.
    pub fn new(ttl: Duration) -> Result<Self, CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::Configuration(
                "cache TTL must be greater than zero".into(),
            ));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                ttl,
            }),
        })
    }

    /// Creates an empty store from a TTL given in (possibly fractional) seconds.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` if `ttl_seconds` is NaN, infinite,
    /// zero, negative or too large to represent.
    pub fn from_secs_f64(ttl_seconds: f64) -> Result<Self, CacheError> {
        if !ttl_seconds.is_finite() || ttl_seconds <= 0.0 {
            return Err(CacheError::Configuration(format!(
                "cache TTL must be a positive, finite number of seconds (got {ttl_seconds})"
            )));
        }

        let ttl = Duration::try_from_secs_f64(ttl_seconds)
            .map_err(|e| CacheError::Configuration(format!("invalid cache TTL: {e}")))?;

        Self::new(ttl)
    }

    /// Returns the value stored under `key` if it has not expired.
    ///
    /// An expired entry found here is removed on the spot.
    pub fn get(&self, key: &str) -> Option<V> {
        let ttl = self.inner.ttl;

        let expired = match self.inner.entries.get(key) {
            Some(entry) if !entry.is_expired(ttl, Instant::now()) => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            // A concurrent `set` may have refreshed the key in between.
            self.inner
                .entries
                .remove_if(key, |_, entry| entry.is_expired(ttl, Instant::now()));
        }

        None
    }

    /// Inserts or replaces the value for `key`, restarting its expiry clock.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.inner.entries.insert(
            key.into(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    /// Number of entries currently held, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Starts a background task that purges expired entries every `interval`.
    ///
    /// The task only holds a weak reference and stops once every handle to the
    /// store has been dropped. Returns `None` when `interval` is zero or when
    /// called outside a Tokio runtime.
    pub fn spawn_sweeper(&self, interval: Duration) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            warn!("Cache sweep interval is zero, sweeper disabled");
            return None;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No Tokio runtime available, cache sweeper disabled");
            return None;
        };

        let weak: Weak<Inner<V>> = Arc::downgrade(&self.inner);

        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(inner) = weak.upgrade() else {
                    break;
                };

                let removed = inner.purge_expired();
                if removed > 0 {
                    debug!(
                        cache.removed = removed,
                        cache.ttl_secs = inner.ttl.as_secs_f64(),
                        "Swept expired cache entries"
                    );
                }
            }
        }))
    }
}
