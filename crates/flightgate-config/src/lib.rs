//! # Flightgate Config
//!
//! Configuration types for the flightgate API, loaded from environment variables:
//!
//! - [`cache`]: Response cache TTLs and sweep interval
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`fare_engine`]: Fare engine endpoint and timeout
//! - [`server`]: Listener addresses
//!
//! Unlike a missing variable, a variable that is set to something unparsable is
//! an error, so a typo in a TTL stops the server at startup.
//!
//! # Example
//!
//! ```ignore
//! use flightgate_config::{CacheConfig, CorsConfig, ServerConfig};
//!
//! let cache_config = CacheConfig::from_env()?;
//! let cors_config = CorsConfig::from_env();
//! let server_config = ServerConfig::from_env()?;
//! ```

pub mod cache;
pub mod cors;
pub mod error;
pub mod fare_engine;
pub mod server;

pub use cache::CacheConfig;
pub use cors::CorsConfig;
pub use error::ConfigError;
pub use fare_engine::FareEngineConfig;
pub use server::ServerConfig;
