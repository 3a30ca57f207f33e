use axum::Json;

use crate::modules::status::model::{HealthResponse, HelloResponse};

#[utoipa::path(
    get,
    path = "/hello",
    responses(
        (status = 200, description = "Greeting, possibly served from cache", body = HelloResponse)
    ),
    tag = "Status"
)]
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        hello: "Hello world!".to_string(),
    })
}

/// Liveness probe. Never cached.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "Status"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
