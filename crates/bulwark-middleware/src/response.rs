//! Response writer and output capture.
//!
//! Stages and endpoints write response bytes through a [`ResponseWriter`].
//! Writes go to the *current sink*: normally the wire buffer that becomes
//! the response body, or the innermost active capture.
//!
//! A capture is opened with [`ResponseWriter::capture`] and is tied to the
//! returned [`CaptureGuard`]. Dropping the guard (early return, `?`, panic
//! unwinding, or the request future being dropped) discards the capture and
//! makes the previous sink current again. [`CaptureGuard::finish`] does the
//! same but hands back the captured bytes.

use crate::types::Response;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct SinkStack {
    wire: BytesMut,
    wire_writes: usize,
    captures: Vec<BytesMut>,
}

/// Status, headers and body sink of the response being produced.
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    sink: Arc<Mutex<SinkStack>>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    /// Creates a writer with status 200, no headers and an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            sink: Arc::new(Mutex::new(SinkStack::default())),
        }
    }

    /// Current status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets the `content-type` header.
    pub fn set_content_type(&mut self, content_type: &'static str) {
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static(content_type),
        );
    }

    /// Appends bytes to the current sink.
    pub fn write(&self, data: impl AsRef<[u8]>) {
        let mut sink = self.sink.lock();
        if let Some(capture) = sink.captures.last_mut() {
            capture.extend_from_slice(data.as_ref());
        } else {
            sink.wire.extend_from_slice(data.as_ref());
            sink.wire_writes += 1;
        }
    }

    /// Redirects writes into a fresh in-memory buffer until the guard is
    /// finished or dropped.
    #[must_use = "dropping the guard ends the capture immediately"]
    pub fn capture(&self) -> CaptureGuard {
        let mut sink = self.sink.lock();
        let depth = sink.captures.len();
        sink.captures.push(BytesMut::new());
        CaptureGuard {
            sink: Arc::clone(&self.sink),
            depth,
            finished: false,
        }
    }

    /// Returns `true` while a capture is active.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        !self.sink.lock().captures.is_empty()
    }

    /// Number of writes that reached the wire buffer.
    #[must_use]
    pub fn wire_writes(&self) -> usize {
        self.sink.lock().wire_writes
    }

    /// Discards everything written so far: headers, wire bytes and any
    /// active capture. The status is left untouched.
    pub fn reset(&mut self) {
        self.headers.clear();
        let mut sink = self.sink.lock();
        sink.wire.clear();
        sink.wire_writes = 0;
        sink.captures.clear();
    }

    /// Builds the final HTTP response from the wire buffer.
    #[must_use]
    pub fn into_response(self) -> Response {
        let body = std::mem::take(&mut self.sink.lock().wire).freeze();
        let mut response = http::Response::new(Full::new(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Active output capture. See the [module docs](self).
#[derive(Debug)]
pub struct CaptureGuard {
    sink: Arc<Mutex<SinkStack>>,
    depth: usize,
    finished: bool,
}

impl CaptureGuard {
    /// Ends the capture and returns what was written into it.
    pub fn finish(mut self) -> Bytes {
        self.finished = true;
        let mut sink = self.sink.lock();
        if sink.captures.len() <= self.depth {
            return Bytes::new();
        }
        sink.captures
            .split_off(self.depth)
            .into_iter()
            .next()
            .map(BytesMut::freeze)
            .unwrap_or_default()
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.sink.lock().captures.truncate(self.depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_reach_wire() {
        let writer = ResponseWriter::new();
        writer.write("hello ");
        writer.write("world");
        assert_eq!(writer.wire_writes(), 2);
        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_capture_diverts_writes() {
        let writer = ResponseWriter::new();
        let guard = writer.capture();
        writer.write("captured");
        assert!(writer.is_capturing());
        assert_eq!(guard.finish(), Bytes::from("captured"));
        assert!(!writer.is_capturing());
        assert_eq!(writer.wire_writes(), 0);
    }

    #[test]
    fn test_dropped_guard_restores_sink() {
        let writer = ResponseWriter::new();
        {
            let _guard = writer.capture();
            writer.write("lost");
        }
        assert!(!writer.is_capturing());
        writer.write("kept");
        assert_eq!(writer.wire_writes(), 1);
    }

    #[test]
    fn test_panic_restores_sink() {
        let writer = ResponseWriter::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = writer.capture();
            panic!("handler exploded");
        }));
        assert!(result.is_err());
        assert!(!writer.is_capturing());
    }

    #[test]
    fn test_nested_captures() {
        let writer = ResponseWriter::new();
        let outer = writer.capture();
        writer.write("a");
        let inner = writer.capture();
        writer.write("b");
        assert_eq!(inner.finish(), Bytes::from("b"));
        writer.write("c");
        assert_eq!(outer.finish(), Bytes::from("ac"));
    }

    #[test]
    fn test_outer_drop_discards_inner() {
        let writer = ResponseWriter::new();
        let outer = writer.capture();
        let inner = writer.capture();
        drop(outer);
        assert!(!writer.is_capturing());
        assert_eq!(inner.finish(), Bytes::new());
    }

    #[test]
    fn test_reset() {
        let mut writer = ResponseWriter::new();
        writer.set_content_type("text/plain");
        writer.write("partial");
        writer.reset();
        assert!(writer.headers().is_empty());
        assert_eq!(writer.wire_writes(), 0);
    }
}
