use utoipa::OpenApi;

use crate::modules::flights::model::{CabinClass, Flight, SearchFlightsDto};
use crate::modules::status::model::{HealthResponse, HelloResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::status::controller::hello,
        crate::modules::status::controller::health,
        crate::modules::flights::controller::search_flights,
        crate::modules::flights::controller::search_flights_query,
    ),
    components(
        schemas(
            HelloResponse,
            HealthResponse,
            SearchFlightsDto,
            CabinClass,
            Flight,
        )
    ),
    tags(
        (name = "Status", description = "Liveness and greeting endpoints"),
        (name = "Flights", description = "Flight search, cached per canonical request body")
    ),
    info(
        title = "Flightgate API",
        version = "0.1.0",
        description = "Flight search gateway with in-process response caching"
    )
)]
pub struct ApiDoc;
