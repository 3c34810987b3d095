//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::header::HeaderName;
use http_body_util::Full;
use std::net::IpAddr;

/// The HTTP request type accepted by the pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Header carrying the request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header whose values form the client identifier.
pub const CLIENT_IDENTIFIER_HEADER: HeaderName = http::header::USER_AGENT;

/// JSON content type.
pub const APPLICATION_JSON: &str = "application/json";

/// Remote peer address, inserted into request extensions by the server.
///
/// ```
/// use bulwark_middleware::types::{RemoteAddr, Request};
/// use bytes::Bytes;
/// use http_body_util::Full;
///
/// let mut request: Request = http::Request::new(Full::new(Bytes::new()));
/// request.extensions_mut().insert(RemoteAddr("10.0.0.1".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddr(pub IpAddr);

/// Extension trait for building plain responses outside the pipeline.
pub trait ResponseExt {
    /// Creates a plain-text response with the given status code.
    fn text(status: http::StatusCode, message: &str) -> Response;

    /// Creates a JSON response from a serialized body.
    fn json(status: http::StatusCode, body: String) -> Response;
}

impl ResponseExt for Response {
    fn text(status: http::StatusCode, message: &str) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(message.to_string())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    fn json(status: http::StatusCode, body: String) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static(APPLICATION_JSON),
        );
        response
    }
}
