//! Fare engine connection settings.
//!
//! # Environment Variables
//!
//! - `FARE_ENGINE_URL`: search endpoint of the fare engine (unset: searches fail with 502)
//! - `FARE_ENGINE_TIMEOUT_SECONDS`: per-request timeout (default: 20)

use crate::error::{ConfigError, parse_var};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FareEngineConfig {
    pub url: Option<String>,
    pub timeout: Duration,
}

impl Default for FareEngineConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(20),
        }
    }
}

impl FareEngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: u64 = parse_var(
            &lookup,
            "FARE_ENGINE_TIMEOUT_SECONDS",
            "a whole number of seconds",
            20,
        )?;

        Ok(Self {
            url: lookup("FARE_ENGINE_URL").filter(|url| !url.trim().is_empty()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
