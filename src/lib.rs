//! # Flightgate API
//!
//! A flight search gateway built with Rust and Axum. Searches are forwarded to
//! a fare engine; successful responses are cached in process for a configurable
//! TTL so identical searches are answered without another upstream round trip.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── flightgate-cache/          # TTL store, cache keys, response cache middleware
//! ├── flightgate-config/         # Environment-driven configuration
//! ├── flightgate-core/           # Shared error type
//! └── flightgate-observability/  # Logging, tracing and Prometheus metrics
//! src/
//! ├── modules/
//! │   ├── flights/   # Flight search (cached per canonical request body)
//! │   └── status/    # /hello (cached) and /health
//! ├── docs.rs        # OpenAPI documentation
//! ├── router.rs      # Main application router
//! └── state.rs       # Shared application state
//! ```
//!
//! ## Caching
//!
//! | Route | Methods cached | Key | TTL variable |
//! |-------|----------------|-----|--------------|
//! | `/hello` | GET | path | `HELLO_CACHE_TTL_SECONDS` |
//! | `/api/flights/search` | GET, POST | path + query, or path + body digest | `SEARCH_CACHE_TTL_SECONDS` |
//!
//! Only 2xx responses are stored. A hit is answered with `200 OK` and the stored
//! body without calling the handler. Each route group has its own store.
//!
//! ## Quick Start
//!
//! ```bash
//! FARE_ENGINE_URL=http://fares.internal/search
//! SEARCH_CACHE_TTL_SECONDS=300
//! cargo run -- --bind 0.0.0.0:3000
//! ```
//!
//! API documentation is served at `/swagger-ui` and `/scalar`.

pub mod docs;
pub mod modules;
pub mod router;
pub mod state;

// Re-export workspace crates for convenience
pub use flightgate_cache;
pub use flightgate_config;
pub use flightgate_core;
pub use flightgate_observability;
