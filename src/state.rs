use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use flightgate_cache::{CacheError, ResponseCache, TtlStore};
use flightgate_config::{CacheConfig, CorsConfig, FareEngineConfig};
use tokio::task::JoinHandle;

use crate::modules::flights::{FlightSearch, fare_engine_from_config};

#[derive(Clone)]
pub struct AppState {
    pub fare_engine: Arc<dyn FlightSearch>,
    pub cors_config: CorsConfig,
    /// Flight search responses, keyed by path and canonical request body.
    pub search_cache: ResponseCache,
    /// `/hello` responses. Separate from the search cache even when the TTLs match.
    pub hello_cache: ResponseCache,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("cors_config", &self.cors_config)
            .field("search_cache", &self.search_cache)
            .field("hello_cache", &self.hello_cache)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Builds the state with one fresh store per cached route group.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` if either TTL is not a positive number of seconds.
    pub fn new(
        fare_engine: Arc<dyn FlightSearch>,
        cors_config: CorsConfig,
        cache_config: &CacheConfig,
    ) -> Result<Self, CacheError> {
        let search_cache = ResponseCache::new(
            "search",
            TtlStore::from_secs_f64(cache_config.search_ttl_seconds)?,
        )
        .with_body_limit(cache_config.max_body_bytes);
        let hello_cache = ResponseCache::new(
            "hello",
            TtlStore::from_secs_f64(cache_config.hello_ttl_seconds)?,
        )
        .with_methods([Method::GET])
        .with_body_limit(cache_config.max_body_bytes);

        Ok(Self {
            fare_engine,
            cors_config,
            search_cache,
            hello_cache,
        })
    }

    /// Starts a background sweep for each cache. Returns no handles when `interval` is zero.
    pub fn spawn_cache_sweepers(&self, interval: Duration) -> Vec<JoinHandle<()>> {
        [&self.search_cache, &self.hello_cache]
            .into_iter()
            .filter_map(|cache| cache.store().spawn_sweeper(interval))
            .collect()
    }
}

/// Assembles the state from the environment, using `cache_config` for the caches.
pub fn init_app_state(cache_config: &CacheConfig) -> anyhow::Result<AppState> {
    let fare_engine = fare_engine_from_config(&FareEngineConfig::from_env()?)?;
    let state = AppState::new(fare_engine, CorsConfig::from_env(), cache_config)?;
    Ok(state)
}
