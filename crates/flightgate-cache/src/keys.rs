//! Cache key derivation.
//!
//! Read-only requests are keyed by their path and query string. Mutating
//! requests that carry a body get a key that also includes a SHA-256 digest of
//! the body, so two searches against the same endpoint with different criteria
//! never share an entry.

use axum::http::Method;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Prefix for keys that include a body digest.
pub const BODY_KEY_PREFIX: &str = "__body__";

/// Methods whose request body takes part in the cache key.
pub fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Derives the cache key for a request whose body has already been parsed.
///
/// Returns `path_and_query` unchanged unless `method` is mutating and `body`
/// is present and non-empty, in which case the key becomes
/// `"__body___<path_and_query>_<sha256 hex>"`.
pub fn derive_key(method: &Method, path_and_query: &str, body: Option<&Value>) -> String {
    match body {
        Some(body) if is_mutating(method) && !is_empty_body(body) => {
            build_key(path_and_query, &digest_value(body))
        }
        _ => path_and_query.to_string(),
    }
}

/// Derives the cache key for a request body that is not JSON.
///
/// The digest is taken over the raw bytes; the rest follows [`derive_key`].
pub fn derive_key_from_bytes(method: &Method, path_and_query: &str, body: &[u8]) -> String {
    if is_mutating(method) && !body.is_empty() {
        build_key(path_and_query, &hex::encode(Sha256::digest(body)))
    } else {
        path_and_query.to_string()
    }
}

/// Returns a copy of `body` with its top-level object keys sorted.
///
/// Nested objects keep the order they were given in. Whole-valued floats are
/// written as integers at any depth, so `1.0` and `1` canonicalize alike.
pub fn canonicalize(body: &Value) -> Value {
    match body {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), normalize_numbers(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        other => normalize_numbers(other),
    }
}

// 2^53: beyond this an f64 no longer holds every integer exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn normalize_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => Value::from(f as i64),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_numbers(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Hex-encoded SHA-256 of the canonical serialization of `body`.
pub fn digest_value(body: &Value) -> String {
    let canonical = canonicalize(body).to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn build_key(path_and_query: &str, digest: &str) -> String {
    format!("{}_{}_{}", BODY_KEY_PREFIX, path_and_query, digest)
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
