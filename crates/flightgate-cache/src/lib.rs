//! # Flightgate Cache
//!
//! In-process HTTP response caching for the flightgate API.
//!
//! This crate provides:
//! - Deterministic cache keys from path, query string and request body
//! - A concurrent TTL store, one instance per configured TTL
//! - An axum middleware that serves cached bodies and captures new ones
//!
//! Nothing here is shared between processes or persisted; a restart begins
//! with empty stores.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::post};
//! use flightgate_cache::{ResponseCache, response_cache_middleware};
//! use std::time::Duration;
//!
//! let cache = ResponseCache::with_ttl("search", Duration::from_secs(300))?;
//! cache.store().spawn_sweeper(Duration::from_secs(30));
//!
//! let app = Router::new()
//!     .route("/api/flights/search", post(search_flights))
//!     .route_layer(middleware::from_fn_with_state(cache, response_cache_middleware));
//! ```

mod capture;
pub mod error;
pub mod keys;
pub mod middleware;
pub mod store;

pub use error::CacheError;
pub use keys::{canonicalize, derive_key, derive_key_from_bytes};
pub use middleware::{
    CachedBody, DEFAULT_BODY_LIMIT, DEFAULT_CACHEABLE_METHODS, Lookup, ResponseCache, request_key,
    response_cache_middleware,
};
pub use store::TtlStore;
