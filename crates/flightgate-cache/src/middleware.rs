//! Response caching middleware.
//!
//! Serves stored bodies for repeated requests and captures the body of
//! successful responses on a miss.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::post};
//! use flightgate_cache::{ResponseCache, response_cache_middleware};
//! use std::time::Duration;
//!
//! let cache = ResponseCache::with_ttl("search", Duration::from_secs(300))?;
//!
//! let app = Router::new()
//!     .route("/search", post(search))
//!     .route_layer(middleware::from_fn_with_state(cache, response_cache_middleware));
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    BoxError,
    body::Body,
    extract::{OriginalUri, Request, State},
    http::{HeaderValue, Method, StatusCode, Uri, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body::{Body as _, Frame};
use http_body_util::{BodyExt, Limited};
use metrics::counter;
use serde_json::Value;
use tracing::{debug, warn};

use crate::capture::{CaptureBody, CaptureSink};
use crate::error::CacheError;
use crate::keys::{derive_key, derive_key_from_bytes, is_mutating};
use crate::store::TtlStore;

/// Methods cached when none are configured explicitly.
pub const DEFAULT_CACHEABLE_METHODS: [Method; 2] = [Method::GET, Method::POST];

/// Largest request body buffered for key derivation, matching axum's default body limit.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// A response body as it was sent to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBody {
    pub body: Bytes,
    pub content_type: Option<HeaderValue>,
}

impl IntoResponse for CachedBody {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = StatusCode::OK;
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        response
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(CachedBody),
    Miss,
}

/// State for [`response_cache_middleware`]: one store plus the methods it applies to.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    name: &'static str,
    store: TtlStore<CachedBody>,
    methods: Arc<[Method]>,
    body_limit: usize,
}

impl ResponseCache {
    /// Wraps an existing store, caching [`DEFAULT_CACHEABLE_METHODS`].
    ///
    /// `name` labels logs and metrics for this cache.
    pub fn new(name: &'static str, store: TtlStore<CachedBody>) -> Self {
        Self {
            name,
            store,
            methods: Arc::from(DEFAULT_CACHEABLE_METHODS),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Creates a cache backed by a fresh store with the given TTL.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` if `ttl` is zero.
    pub fn with_ttl(name: &'static str, ttl: Duration) -> Result<Self, CacheError> {
        Ok(Self::new(name, TtlStore::new(ttl)?))
    }

    /// Replaces the set of methods this cache applies to.
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Caps how many request body bytes are read to derive a key.
    ///
    /// A larger body is not cached; the handler sees a body that fails with a
    /// length limit error, which axum extractors answer with `413`.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn store(&self) -> &TtlStore<CachedBody> {
        &self.store
    }

    pub fn is_cacheable(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn lookup(&self, key: &str) -> Lookup {
        match self.store.get(key) {
            Some(cached) => Lookup::Hit(cached),
            None => Lookup::Miss,
        }
    }
}

/// Computes the cache key for a request from its original URI and raw body.
///
/// JSON bodies are canonicalized before hashing; anything else is hashed as is.
pub fn request_key(method: &Method, uri: &Uri, body: &[u8]) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    if !is_mutating(method) || body.is_empty() {
        return derive_key(method, path_and_query, None);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value) => derive_key(method, path_and_query, Some(&value)),
        Err(_) => derive_key_from_bytes(method, path_and_query, body),
    }
}

/// Response caching middleware.
///
/// For cacheable methods:
/// 1. Derives the key from the original path, query string and body
/// 2. Returns the stored body with `200 OK` on a hit without running the handler
/// 3. On a miss, runs the handler and stores the body of a 2xx response once
///    it has been sent in full
///
/// Other methods pass straight through, and only mutating requests have their
/// body read, at most [`ResponseCache::body_limit`] bytes of it. The middleware
/// never fails a request: anything that prevents caching just means the
/// response is not stored, and a body that could not be read reaches the
/// handler as the same error.
pub async fn response_cache_middleware(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if !cache.is_cacheable(request.method()) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| parts.uri.clone());

    // Only mutating requests have their body in the key.
    let (key, body) = if is_mutating(&parts.method) {
        match Limited::new(body, cache.body_limit()).collect().await {
            Ok(collected) => {
                let bytes = collected.to_bytes();
                (request_key(&parts.method, &uri, &bytes), Body::from(bytes))
            }
            Err(e) => {
                warn!(
                    cache.store = cache.name(),
                    error = %CacheError::Serialization(e.to_string()),
                    "Failed to read request body, bypassing cache"
                );
                let body = Body::new(FailedBody { error: Some(e) });
                return next.run(Request::from_parts(parts, body)).await;
            }
        }
    } else {
        (request_key(&parts.method, &uri, &[]), body)
    };

    if let Lookup::Hit(cached) = cache.lookup(&key) {
        debug!(cache.store = cache.name(), cache.key = %key, "Cache hit");
        counter!("http_cache_lookups_total", "store" => cache.name(), "outcome" => "hit")
            .increment(1);
        return cached.into_response();
    }

    debug!(cache.store = cache.name(), cache.key = %key, "Cache miss");
    counter!("http_cache_lookups_total", "store" => cache.name(), "outcome" => "miss")
        .increment(1);

    let response = next.run(Request::from_parts(parts, body)).await;

    if !response.status().is_success() {
        debug!(
            cache.store = cache.name(),
            cache.key = %key,
            status = %response.status().as_u16(),
            "Response not cacheable"
        );
        return response;
    }

    let (parts, body) = response.into_parts();
    let content_type = parts.headers.get(CONTENT_TYPE).cloned();
    let sink = CaptureSink::new(cache, key, content_type);

    // An empty body may never be polled by the transport.
    if body.is_end_stream() {
        sink.commit(Bytes::new());
        return Response::from_parts(parts, body);
    }

    Response::from_parts(parts, Body::new(CaptureBody::new(body, sink)))
}

/// Stands in for a request body that could not be read, replaying its error
/// to whoever reads it next.
struct FailedBody {
    error: Option<BoxError>,
}

impl http_body::Body for FailedBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.error.take().map(Err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        http::Request as HttpRequest,
        middleware,
        routing::{get, post},
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::advance;
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct Calls(Arc<AtomicUsize>);

    impl Calls {
        fn bump(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst) + 1
        }

        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn app(cache: ResponseCache, calls: Calls) -> Router {
        let hello_calls = calls.clone();
        let search_calls = calls.clone();
        let fail_calls = calls.clone();
        let delete_calls = calls.clone();
        let ping_calls = calls.clone();
        let empty_calls = calls;

        Router::new()
            .route(
                "/hello",
                get(move || {
                    let calls = hello_calls.clone();
                    async move {
                        let n = calls.bump();
                        Json(json!({"hello": "Hello world!", "call": n}))
                    }
                }),
            )
            .route(
                "/search",
                post(move |Json(_query): Json<Value>| {
                    let calls = search_calls.clone();
                    async move {
                        let n = calls.bump();
                        Json(json!([{"price": 100 * n}]))
                    }
                }),
            )
            .route(
                "/failing",
                get(move || {
                    let calls = fail_calls.clone();
                    async move {
                        calls.bump();
                        (StatusCode::BAD_GATEWAY, "upstream down")
                    }
                })
                .delete(move || {
                    let calls = delete_calls.clone();
                    async move {
                        let n = calls.bump();
                        format!("deleted {n}")
                    }
                }),
            )
            .route(
                "/ping",
                post(move || {
                    let calls = ping_calls.clone();
                    async move {
                        calls.bump();
                        "pong"
                    }
                }),
            )
            .route(
                "/empty",
                get(move || {
                    let calls = empty_calls.clone();
                    async move {
                        calls.bump();
                        StatusCode::NO_CONTENT
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(
                cache,
                response_cache_middleware,
            ))
    }

    /// Endless stream of 16 KiB chunks that records how much was pulled from it.
    struct StreamingBody {
        remaining: usize,
        pulled: Arc<AtomicUsize>,
    }

    impl http_body::Body for StreamingBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            if self.remaining == 0 {
                return Poll::Ready(None);
            }
            let chunk = self.remaining.min(16 * 1024);
            self.remaining -= chunk;
            self.pulled.fetch_add(chunk, Ordering::SeqCst);
            Poll::Ready(Some(Ok(Frame::data(Bytes::from(vec![b'a'; chunk])))))
        }
    }

    fn streaming_request(method: Method, uri: &str, len: usize) -> (HttpRequest<Body>, Arc<AtomicUsize>) {
        let pulled = Arc::new(AtomicUsize::new(0));
        let body = StreamingBody {
            remaining: len,
            pulled: pulled.clone(),
        };
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::new(body))
            .unwrap();
        (request, pulled)
    }

    /// Request body that fails on the first read.
    struct BrokenBody;

    impl http_body::Body for BrokenBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
        }
    }

    fn broken_request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::new(BrokenBody))
            .unwrap()
    }

    fn get_request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_request(uri: &str, body: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: HttpRequest<Body>) -> (StatusCode, Option<HeaderValue>, Bytes) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body)
    }

    fn cache(ttl_secs: u64) -> ResponseCache {
        ResponseCache::with_ttl("test", Duration::from_secs(ttl_secs)).unwrap()
    }

    #[test]
    fn test_request_key_uses_path_and_query() {
        let uri: Uri = "/hello?lang=en".parse().unwrap();
        assert_eq!(request_key(&Method::GET, &uri, b""), "/hello?lang=en");
    }

    #[test]
    fn test_request_key_canonicalizes_json() {
        let uri: Uri = "/search".parse().unwrap();
        assert_eq!(
            request_key(&Method::POST, &uri, br#"{"b":2,"a":1}"#),
            request_key(&Method::POST, &uri, br#"{"a":1,"b":2}"#)
        );
    }

    #[test]
    fn test_request_key_hashes_non_json_bodies() {
        let uri: Uri = "/search".parse().unwrap();
        let key = request_key(&Method::POST, &uri, b"not json");
        assert!(key.starts_with(crate::keys::BODY_KEY_PREFIX));
        assert_ne!(key, request_key(&Method::POST, &uri, b"also not json"));
    }

    #[test]
    fn test_default_methods() {
        let cache = cache(1);
        assert!(cache.is_cacheable(&Method::GET));
        assert!(cache.is_cacheable(&Method::POST));
        assert!(!cache.is_cacheable(&Method::DELETE));

        let cache = cache.with_methods([Method::GET]);
        assert!(!cache.is_cacheable(&Method::POST));
    }

    #[test]
    fn test_zero_ttl_fails_at_setup() {
        let result = ResponseCache::with_ttl("test", Duration::ZERO);
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_after_miss_skips_handler() {
        let calls = Calls::default();
        let app = app(cache(60), calls.clone());

        let (status, _, first) = send(&app, get_request("/hello")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, content_type, second) = send(&app, get_request("/hello")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, second);
        assert_eq!(
            content_type,
            Some(HeaderValue::from_static("application/json"))
        );
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_string_is_part_of_key() {
        let calls = Calls::default();
        let app = app(cache(60), calls.clone());

        send(&app, get_request("/hello?lang=en")).await;
        send(&app, get_request("/hello?lang=fr")).await;
        send(&app, get_request("/hello?lang=en")).await;

        assert_eq!(calls.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_responses_are_not_stored() {
        let calls = Calls::default();
        let cache = cache(60);
        let app = app(cache.clone(), calls.clone());

        let (status, _, _) = send(&app, get_request("/failing")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let (status, _, body) = send(&app, get_request("/failing")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(&body[..], b"upstream down");

        assert_eq!(calls.count(), 2);
        assert_eq!(cache.lookup("/failing"), Lookup::Miss);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uncacheable_method_bypasses_cache() {
        let calls = Calls::default();
        let cache = cache(60);
        let app = app(cache.clone(), calls.clone());

        let delete = || {
            HttpRequest::builder()
                .method("DELETE")
                .uri("/failing")
                .body(Body::empty())
                .unwrap()
        };

        let (_, _, first) = send(&app, delete()).await;
        let (_, _, second) = send(&app, delete()).await;

        assert_eq!(&first[..], b"deleted 1");
        assert_eq!(&second[..], b"deleted 2");
        assert!(cache.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_scenario_with_expiry() {
        let calls = Calls::default();
        let app = app(cache(2), calls.clone());

        let (status, _, first) = send(&app, post_request("/search", r#"{"b":2,"a":1}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&first[..], br#"[{"price":100}]"#);

        advance(Duration::from_secs(1)).await;
        let (_, _, second) = send(&app, post_request("/search", r#"{"a":1,"b":2}"#)).await;
        assert_eq!(&second[..], br#"[{"price":100}]"#);
        assert_eq!(calls.count(), 1);

        advance(Duration::from_secs(2)).await;
        let (_, _, third) = send(&app, post_request("/search", r#"{"a":1,"b":2}"#)).await;
        assert_eq!(&third[..], br#"[{"price":200}]"#);
        assert_eq!(calls.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_bodies_are_cached_separately() {
        let calls = Calls::default();
        let app = app(cache(60), calls.clone());

        send(&app, post_request("/search", r#"{"origin":"LHR"}"#)).await;
        send(&app, post_request("/search", r#"{"origin":"JFK"}"#)).await;
        send(&app, post_request("/search", r#"{"origin":"LHR"}"#)).await;

        assert_eq!(calls.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_request_body_is_not_stored() {
        let calls = Calls::default();
        let cache = cache(60);
        let app = app(cache.clone(), calls.clone());

        // The JSON extractor rejects this before the handler runs.
        let (status, _, _) = send(&app, post_request("/search", "{not json")).await;
        assert!(status.is_client_error());
        assert_eq!(calls.count(), 0);
        assert!(cache.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stores_with_different_ttls_do_not_share_entries() {
        let calls = Calls::default();
        let short = cache(1);
        let long = cache(60);
        let short_app = app(short.clone(), calls.clone());
        let long_app = app(long.clone(), calls.clone());

        send(&short_app, get_request("/hello")).await;
        assert!(matches!(short.lookup("/hello"), Lookup::Hit(_)));
        assert_eq!(long.lookup("/hello"), Lookup::Miss);

        send(&long_app, get_request("/hello")).await;
        assert_eq!(calls.count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_body_is_not_buffered() {
        let calls = Calls::default();
        let cache = cache(60).with_body_limit(1024);
        let app = app(cache.clone(), calls.clone());

        let (request, pulled) = streaming_request(Method::POST, "/search", 64 * 1024 * 1024);
        let (status, _, _) = send(&app, request).await;

        assert!(status.is_client_error());
        assert!(pulled.load(Ordering::SeqCst) <= 64 * 1024);
        assert_eq!(calls.count(), 0);
        assert!(cache.store().is_empty());
    }

    #[tokio::test]
    async fn test_body_within_limit_is_cached() {
        let calls = Calls::default();
        let cache = cache(60).with_body_limit(32);
        let app = app(cache.clone(), calls.clone());

        send(&app, post_request("/search", r#"{"a":1}"#)).await;
        send(&app, post_request("/search", r#"{"a":1}"#)).await;

        assert_eq!(calls.count(), 1);
        assert_eq!(cache.store().len(), 1);
    }

    #[tokio::test]
    async fn test_read_only_request_body_is_left_unread() {
        let calls = Calls::default();
        let cache = cache(60).with_body_limit(1024);
        let app = app(cache.clone(), calls.clone());

        let (request, pulled) = streaming_request(Method::GET, "/hello", 64 * 1024 * 1024);
        let (status, _, _) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(pulled.load(Ordering::SeqCst), 0);
        assert!(matches!(cache.lookup("/hello"), Lookup::Hit(_)));
    }

    #[tokio::test]
    async fn test_unreadable_body_still_reaches_handler() {
        let calls = Calls::default();
        let cache = cache(60);
        let app = app(cache.clone(), calls.clone());

        let (status, _, body) = send(&app, broken_request("/ping")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"pong");
        assert_eq!(calls.count(), 1);
        assert!(cache.store().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_body_error_is_seen_by_extractor() {
        let calls = Calls::default();
        let cache = cache(60);
        let app = app(cache.clone(), calls.clone());

        let (status, _, _) = send(&app, broken_request("/search")).await;

        assert!(status.is_client_error());
        assert_eq!(calls.count(), 0);
        assert!(cache.store().is_empty());
    }

    #[tokio::test]
    async fn test_empty_success_body_is_stored() {
        let calls = Calls::default();
        let cache = cache(60);
        let app = app(cache.clone(), calls.clone());

        let (status, _, body) = send(&app, get_request("/empty")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        match cache.lookup("/empty") {
            Lookup::Hit(cached) => assert!(cached.body.is_empty()),
            Lookup::Miss => panic!("empty 2xx body was not stored"),
        }

        let (status, _, body) = send(&app, get_request("/empty")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(calls.count(), 1);
    }
}
