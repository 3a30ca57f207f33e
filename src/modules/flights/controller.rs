use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use flightgate_core::AppError;

use crate::modules::flights::model::{Flight, SearchFlightsDto};
use crate::modules::flights::service::FlightService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/flights/search",
    request_body = SearchFlightsDto,
    responses(
        (status = 200, description = "Matching flights, possibly served from cache", body = Vec<Flight>),
        (status = 422, description = "Invalid search criteria"),
        (status = 502, description = "Fare engine unavailable or failed"),
        (status = 504, description = "Fare engine timed out")
    ),
    tag = "Flights"
)]
#[instrument(skip(state))]
pub async fn search_flights(
    State(state): State<AppState>,
    Json(dto): Json<SearchFlightsDto>,
) -> Result<Json<Vec<Flight>>, AppError> {
    let flights = FlightService::search_flights(state.fare_engine.as_ref(), dto).await?;
    Ok(Json(flights))
}

#[utoipa::path(
    get,
    path = "/api/flights/search",
    params(SearchFlightsDto),
    responses(
        (status = 200, description = "Matching flights, possibly served from cache", body = Vec<Flight>),
        (status = 422, description = "Invalid search criteria"),
        (status = 502, description = "Fare engine unavailable or failed"),
        (status = 504, description = "Fare engine timed out")
    ),
    tag = "Flights"
)]
#[instrument(skip(state))]
pub async fn search_flights_query(
    State(state): State<AppState>,
    Query(dto): Query<SearchFlightsDto>,
) -> Result<Json<Vec<Flight>>, AppError> {
    let flights = FlightService::search_flights(state.fare_engine.as_ref(), dto).await?;
    Ok(Json(flights))
}
