use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use flightgate::modules::flights::testing::StubFareEngine;
use flightgate::router::init_router;
use flightgate::state::AppState;
use flightgate_config::{CacheConfig, CorsConfig};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

#[allow(dead_code)]
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub engine: StubFareEngine,
}

/// Builds the full router over a stub fare engine quoting `prices`.
pub fn setup_test_app(search_ttl: f64, hello_ttl: f64, prices: &[f64]) -> TestApp {
    let engine = StubFareEngine::with_prices(prices);
    let config = CacheConfig {
        search_ttl_seconds: search_ttl,
        hello_ttl_seconds: hello_ttl,
        sweep_interval_seconds: 0,
        ..CacheConfig::default()
    };
    let state = AppState::new(
        Arc::new(engine.clone()),
        CorsConfig::from_origins("http://localhost:3000"),
        &config,
    )
    .unwrap();

    TestApp {
        app: init_router(state.clone()),
        state,
        engine,
    }
}

#[allow(dead_code)]
pub fn search_body() -> Value {
    json!({
        "origin": "LHR",
        "destination": "JFK",
        "departure_date": "2026-12-01",
        "adults": 2
    })
}

#[allow(dead_code)]
pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_raw(uri, &serde_json::to_string(body).unwrap())
}

#[allow(dead_code)]
pub fn post_raw(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Sends `request` and reads the whole body, which is when a miss gets stored.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, body)
}

#[allow(dead_code)]
pub fn first_price(body: &Value) -> f64 {
    body[0]["price"].as_f64().unwrap()
}
