use axum::{Router, middleware, routing::get};
use flightgate_cache::{ResponseCache, response_cache_middleware};

use crate::state::AppState;

use super::controller::{health, hello};

/// `/hello` sits behind `cache`; `/health` is always answered live.
pub fn init_status_router(cache: ResponseCache) -> Router<AppState> {
    Router::new()
        .route("/hello", get(hello))
        .route_layer(middleware::from_fn_with_state(
            cache,
            response_cache_middleware,
        ))
        .route("/health", get(health))
}
