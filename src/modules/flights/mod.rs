pub mod controller;
pub mod model;
pub mod router;
pub mod service;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use model::*;
pub use router::init_flights_router;
pub use service::{FlightSearch, FlightSearchError, FlightService, fare_engine_from_config};
