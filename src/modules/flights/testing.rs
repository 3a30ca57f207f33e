//! In-memory fare engine for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Duration;

use super::model::{Flight, SearchFlightsDto};
use super::service::{FlightSearch, FlightSearchError, FlightSearchFuture};

#[derive(Debug, Default)]
struct StubState {
    prices: Vec<f64>,
    failure: Option<u16>,
}

/// Answers every search with one flight per configured price and counts how
/// many searches actually reached it. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct StubFareEngine {
    state: Arc<Mutex<StubState>>,
    calls: Arc<AtomicUsize>,
}

impl StubFareEngine {
    pub fn with_prices(prices: &[f64]) -> Self {
        let engine = Self::default();
        engine.set_prices(prices);
        engine
    }

    pub fn set_prices(&self, prices: &[f64]) {
        if let Ok(mut state) = self.state.lock() {
            state.prices = prices.to_vec();
        }
    }

    /// Makes subsequent searches fail as if the engine answered `status`.
    pub fn fail_with(&self, status: u16) {
        if let Ok(mut state) = self.state.lock() {
            state.failure = Some(status);
        }
    }

    pub fn recover(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.failure = None;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FlightSearch for StubFareEngine {
    fn search(&self, query: SearchFlightsDto) -> FlightSearchFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self
            .state
            .lock()
            .map(|state| (state.prices.clone(), state.failure))
            .unwrap_or_default();

        Box::pin(async move {
            let (prices, failure) = snapshot;
            if let Some(status) = failure {
                return Err(FlightSearchError::Upstream(status));
            }

            let departure = query
                .departure_date
                .and_hms_opt(9, 0, 0)
                .unwrap_or_default()
                .and_utc();

            Ok(prices
                .iter()
                .enumerate()
                .map(|(i, price)| Flight {
                    id: format!("{}-{}-{i}", query.origin, query.destination),
                    carrier: "FG".into(),
                    flight_number: format!("FG{}", 100 + i),
                    origin: query.origin.clone(),
                    destination: query.destination.clone(),
                    departure,
                    arrival: departure + Duration::hours(7),
                    price: *price,
                    currency: "USD".into(),
                })
                .collect())
        })
    }
}
