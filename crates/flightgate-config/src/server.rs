//! HTTP listener configuration.
//!
//! # Environment Variables
//!
//! - `BIND_ADDRESS`: address the API listens on (default: `0.0.0.0:3000`)
//! - `METRICS_BIND_ADDRESS`: address the Prometheus endpoint listens on (default: `0.0.0.0:9090`)

use crate::error::{ConfigError, parse_var};
use std::net::SocketAddr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub metrics_bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            metrics_bind_address: SocketAddr::from(([0, 0, 0, 0], 9090)),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            bind_address: parse_var(
                &lookup,
                "BIND_ADDRESS",
                "a socket address such as 0.0.0.0:3000",
                defaults.bind_address,
            )?,
            metrics_bind_address: parse_var(
                &lookup,
                "METRICS_BIND_ADDRESS",
                "a socket address such as 0.0.0.0:9090",
                defaults.metrics_bind_address,
            )?,
        })
    }
}
