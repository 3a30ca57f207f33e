use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{search_flights, search_flights_query};

pub fn init_flights_router() -> Router<AppState> {
    Router::new().route("/search", post(search_flights).get(search_flights_query))
}
