use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use flightgate_config::FareEngineConfig;
use flightgate_core::AppError;
use flightgate_observability::{track_fare_engine_duration, track_flight_search};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::modules::flights::model::{Flight, SearchFlightsDto};

pub type FlightSearchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Flight>, FlightSearchError>> + Send + 'a>>;

/// Executes flight searches against a fare engine.
///
/// The gateway treats the engine as a black box; implementations decide how
/// to reach it.
pub trait FlightSearch: Send + Sync {
    fn search(&self, query: SearchFlightsDto) -> FlightSearchFuture<'_>;
}

#[derive(Debug, thiserror::Error)]
pub enum FlightSearchError {
    #[error("Fare engine is not configured")]
    Unavailable,

    #[error("Fare engine request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Fare engine responded with status {0}")]
    Upstream(u16),

    #[error("Fare engine did not respond in time")]
    Timeout,
}

impl FlightSearchError {
    pub fn into_app_error(self) -> AppError {
        match self {
            FlightSearchError::Timeout => AppError::gateway_timeout(self),
            other => AppError::bad_gateway(other),
        }
    }
}

/// Fare engine reached over HTTP: the query is POSTed as JSON and a JSON array
/// of flights is expected back.
#[derive(Debug, Clone)]
pub struct HttpFareEngine {
    client: reqwest::Client,
    url: String,
}

impl HttpFareEngine {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl FlightSearch for HttpFareEngine {
    fn search(&self, query: SearchFlightsDto) -> FlightSearchFuture<'_> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .json(&query)
                .send()
                .await
                .map_err(classify)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FlightSearchError::Upstream(status.as_u16()));
            }

            response.json::<Vec<Flight>>().await.map_err(classify)
        })
    }
}

fn classify(err: reqwest::Error) -> FlightSearchError {
    if err.is_timeout() {
        FlightSearchError::Timeout
    } else {
        FlightSearchError::Transport(err)
    }
}

/// Used when no fare engine URL is configured; every search fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableFareEngine;

impl FlightSearch for UnavailableFareEngine {
    fn search(&self, _query: SearchFlightsDto) -> FlightSearchFuture<'_> {
        Box::pin(async { Err(FlightSearchError::Unavailable) })
    }
}

/// Builds the fare engine described by `config`.
pub fn fare_engine_from_config(
    config: &FareEngineConfig,
) -> Result<Arc<dyn FlightSearch>, reqwest::Error> {
    match &config.url {
        Some(url) => Ok(Arc::new(HttpFareEngine::new(url.clone(), config.timeout)?)),
        None => {
            warn!("FARE_ENGINE_URL not set, flight searches will fail with 502");
            Ok(Arc::new(UnavailableFareEngine))
        }
    }
}

pub struct FlightService;

impl FlightService {
    #[instrument(skip(engine))]
    pub async fn search_flights(
        engine: &dyn FlightSearch,
        query: SearchFlightsDto,
    ) -> Result<Vec<Flight>, AppError> {
        if let Err(e) = query.validate() {
            track_flight_search("invalid");
            return Err(AppError::unprocessable(e));
        }

        let start = Instant::now();
        let result = engine.search(query).await;
        track_fare_engine_duration(start.elapsed().as_secs_f64());

        match result {
            Ok(flights) => {
                track_flight_search("success");
                info!(flights = flights.len(), "Flight search completed");
                Ok(flights)
            }
            Err(e) => {
                track_flight_search("upstream_error");
                Err(e.into_app_error())
            }
        }
    }
}
