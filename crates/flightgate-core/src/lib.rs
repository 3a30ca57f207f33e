//! # Flightgate Core
//!
//! Core types shared across the flightgate crates.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//!
//! # Example
//!
//! ```ignore
//! use flightgate_core::errors::AppError;
//!
//! let error = AppError::bad_gateway(anyhow::anyhow!("fare engine unavailable"));
//! ```

pub mod errors;

pub use errors::AppError;
