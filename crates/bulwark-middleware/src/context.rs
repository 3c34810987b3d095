//! Per-request state shared by the pipeline stages.
//!
//! [`RequestContext`] replaces a string-keyed item bag with typed fields.
//! Producer stages set flags, consumer stages read them:
//!
//! | Field | Producer | Consumer |
//! |---|---|---|
//! | `blocked_ip` | IP check | IP short-circuit |
//! | `browser_invalid` | browser check | browser short-circuit |
//! | `content` | content generation | response finalization |
//! | `error_payload` | short-circuit stages | response finalization |
//!
//! Flags are write-once: a second write is ignored with a warning.

use crate::response::ResponseWriter;
use crate::types::{RemoteAddr, Request, Response, CLIENT_IDENTIFIER_HEADER, REQUEST_ID_HEADER};
use bulwark_core::RequestId;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri};
use http_body_util::BodyExt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Context that flows through the pipeline for one request.
///
/// # Example
///
/// ```
/// use bulwark_middleware::context::RequestContext;
///
/// let mut ctx = RequestContext::new();
/// assert_eq!(ctx.blocked_ip(), None);
/// ctx.set_blocked_ip(false);
/// assert_eq!(ctx.blocked_ip(), Some(false));
/// ```
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    started_at: Instant,

    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,

    remote_address: Option<IpAddr>,
    client_identifier: String,

    blocked_ip: Option<bool>,
    browser_invalid: Option<bool>,
    content: Option<String>,
    error_payload: Option<String>,

    response: ResponseWriter,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Creates a context for an empty `GET /` request with no remote address.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(http::Request::new(()).into_parts().0, Bytes::new())
    }

    /// Creates a context from an incoming request, consuming its body.
    pub async fn from_request(request: Request) -> Self {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self::from_parts(parts, body)
    }

    /// Creates a context from request parts and an already collected body.
    #[must_use]
    pub fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        let remote_address = parts.extensions.get::<RemoteAddr>().map(|addr| addr.0);

        let client_identifier = parts
            .headers
            .get_all(CLIENT_IDENTIFIER_HEADER)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(" ");

        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();

        Self {
            request_id,
            started_at: Instant::now(),
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            remote_address,
            client_identifier,
            blocked_ip: None,
            browser_invalid: None,
            content: None,
            error_payload: None,
            response: ResponseWriter::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Remote peer address, if the transport supplied one.
    #[must_use]
    pub fn remote_address(&self) -> Option<IpAddr> {
        self.remote_address
    }

    /// Raw client identifier (all `User-Agent` values joined with a space).
    #[must_use]
    pub fn client_identifier(&self) -> &str {
        &self.client_identifier
    }

    /// Whether the remote address was rejected; `None` until checked.
    #[must_use]
    pub fn blocked_ip(&self) -> Option<bool> {
        self.blocked_ip
    }

    /// Records the IP check result.
    ///
    /// This should only be called by the IP check stage.
    pub fn set_blocked_ip(&mut self, blocked: bool) {
        set_once(&mut self.blocked_ip, blocked, "blocked_ip");
    }

    /// Whether the client browser was rejected; `None` until checked.
    #[must_use]
    pub fn browser_invalid(&self) -> Option<bool> {
        self.browser_invalid
    }

    /// Records the browser check result.
    ///
    /// This should only be called by the browser check stage.
    pub fn set_browser_invalid(&mut self, invalid: bool) {
        set_once(&mut self.browser_invalid, invalid, "browser_invalid");
    }

    /// Success payload, if one was produced.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Stores the success payload.
    pub fn set_content(&mut self, content: impl Into<String>) {
        set_once(&mut self.content, content.into(), "content");
    }

    /// Error payload, if a stage rejected the request.
    #[must_use]
    pub fn error_payload(&self) -> Option<&str> {
        self.error_payload.as_deref()
    }

    /// Stores an error payload.
    pub fn set_error_payload(&mut self, payload: impl Into<String>) {
        set_once(&mut self.error_payload, payload.into(), "error_payload");
    }

    /// The response being produced.
    #[must_use]
    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    /// Mutable access to the response being produced.
    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// Finishes the request and builds the HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response {
        let request_id = self.request_id;
        let mut response = self.response.into_response();
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) {
    if slot.is_some() {
        tracing::warn!(field, "Request context field already set; keeping first value");
        return;
    }
    *slot = Some(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn request() -> http::request::Builder {
        http::Request::builder().uri("/api/rest/data2?x=1")
    }

    #[tokio::test]
    async fn test_from_request() {
        let mut req = request()
            .header("user-agent", "Firefox/57.0")
            .header("user-agent", "(X11)")
            .body(Full::new(Bytes::from("payload")))
            .unwrap();
        req.extensions_mut()
            .insert(RemoteAddr("10.0.0.9".parse().unwrap()));

        let ctx = RequestContext::from_request(req).await;
        assert_eq!(ctx.path(), "/api/rest/data2");
        assert_eq!(ctx.query(), Some("x=1"));
        assert_eq!(ctx.client_identifier(), "Firefox/57.0 (X11)");
        assert_eq!(ctx.remote_address(), Some("10.0.0.9".parse().unwrap()));
        assert_eq!(ctx.body(), &Bytes::from("payload"));
    }

    #[tokio::test]
    async fn test_missing_headers() {
        let req = request().body(Full::new(Bytes::new())).unwrap();
        let ctx = RequestContext::from_request(req).await;
        assert_eq!(ctx.client_identifier(), "");
        assert_eq!(ctx.remote_address(), None);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let id = RequestId::new();
        let req = request()
            .header(REQUEST_ID_HEADER, id.to_string())
            .body(Full::new(Bytes::new()))
            .unwrap();
        let ctx = RequestContext::from_request(req).await;
        assert_eq!(ctx.request_id(), id);
        assert_eq!(
            ctx.into_response().headers().get(REQUEST_ID_HEADER).unwrap(),
            id.to_string().as_str()
        );
    }

    #[test]
    fn test_flags_are_write_once() {
        let mut ctx = RequestContext::new();
        ctx.set_blocked_ip(true);
        ctx.set_blocked_ip(false);
        assert_eq!(ctx.blocked_ip(), Some(true));

        ctx.set_browser_invalid(false);
        ctx.set_browser_invalid(true);
        assert_eq!(ctx.browser_invalid(), Some(false));
    }

    #[test]
    fn test_payloads() {
        let mut ctx = RequestContext::new();
        assert!(ctx.content().is_none());
        assert!(ctx.error_payload().is_none());
        ctx.set_content("{}");
        ctx.set_error_payload("{\"status\":\"error\"}");
        assert_eq!(ctx.content(), Some("{}"));
        assert_eq!(ctx.error_payload(), Some("{\"status\":\"error\"}"));
    }
}
