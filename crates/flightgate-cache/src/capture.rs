//! Response body decorator that snapshots what it forwards.
//!
//! [`CaptureBody`] passes every frame of the wrapped body through untouched and
//! keeps a copy of the data. Once the body has been emitted in full the copy is
//! written to the cache. A body that errors or is dropped before completion
//! stores nothing.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::HeaderValue;
use bytes::{Bytes, BytesMut};
use http_body::{Frame, SizeHint};
use metrics::counter;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::middleware::{CachedBody, ResponseCache};

/// Where a captured body ends up.
pub(crate) struct CaptureSink {
    cache: ResponseCache,
    key: String,
    content_type: Option<HeaderValue>,
}

impl CaptureSink {
    pub(crate) fn new(cache: ResponseCache, key: String, content_type: Option<HeaderValue>) -> Self {
        Self {
            cache,
            key,
            content_type,
        }
    }

    pub(crate) fn commit(self, body: Bytes) {
        debug!(
            cache.store = self.cache.name(),
            cache.key = %self.key,
            cache.bytes = body.len(),
            "Cache set"
        );
        counter!("http_cache_stores_total", "store" => self.cache.name()).increment(1);

        self.cache.store().set(
            self.key,
            CachedBody {
                body,
                content_type: self.content_type,
            },
        );
    }

    fn abandon(self, err: CacheError) {
        warn!(
            cache.store = self.cache.name(),
            cache.key = %self.key,
            error = %err,
            "Skipping cache write"
        );
    }
}

/// Body wrapper installed on a single successful response.
pub(crate) struct CaptureBody {
    inner: Body,
    buffer: BytesMut,
    sink: Option<CaptureSink>,
}

impl CaptureBody {
    pub(crate) fn new(inner: Body, sink: CaptureSink) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            sink: Some(sink),
        }
    }

    fn finish(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.commit(self.buffer.split().freeze());
        }
    }
}

impl http_body::Body for CaptureBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if this.sink.is_some() {
                    if let Some(data) = frame.data_ref() {
                        this.buffer.extend_from_slice(data);
                    }
                }
                // The transport may stop polling once the inner body reports
                // its end, so the write cannot wait for a trailing `None`.
                if this.inner.is_end_stream() {
                    this.finish();
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                if let Some(sink) = this.sink.take() {
                    sink.abandon(CacheError::Serialization(err.to_string()));
                }
                this.buffer.clear();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
