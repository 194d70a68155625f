//! HTTP response building module
//!
//! The shared response body type plus builders for the fixed-shape
//! responses (errors, 304, OPTIONS), decoupled from the file handler.

use crate::http::date::format_http_date;
use crate::logger;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Body type shared by buffered and streamed responses. Streamed bodies
/// surface disk I/O failures to the transport as `io::Error`.
pub type ResponseBody = BoxBody<Bytes, std::io::Error>;

/// Wrap a complete in-memory buffer as a response body.
#[must_use]
pub fn full_body(data: Bytes) -> ResponseBody {
    Full::new(data)
        .map_err(|never: std::convert::Infallible| match never {})
        .boxed()
}

/// An empty response body.
#[must_use]
pub fn empty_body() -> ResponseBody {
    full_body(Bytes::new())
}

/// Build a plain-text error response for a status code.
pub fn build_error_response(status: StatusCode) -> Response<ResponseBody> {
    let reason = status.canonical_reason().unwrap_or("Error");
    let text = format!("{} {reason}", status.as_u16());

    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", text.len())
        .body(full_body(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_u16(), &e);
            Response::new(empty_body())
        })
}

/// Build a 304 Not Modified response carrying only the validators.
pub fn build_not_modified_response(mtime: i64, etag: &str) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("Last-Modified", format_http_date(mtime));

    if !etag.is_empty() {
        builder = builder.header("Etag", etag);
    }

    builder.body(empty_body()).unwrap_or_else(|e| {
        log_build_error(304, &e);
        Response::new(empty_body())
    })
}

/// Build the 204 response for OPTIONS requests.
pub fn build_options_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", "GET, HEAD, OPTIONS")
        .header("Accept-Ranges", "bytes")
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error(204, &e);
            Response::new(empty_body())
        })
}

/// Log response build error
fn log_build_error(status: u16, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
