//! Request identification.
//!
//! # Responsibilities
//! - Assign a UUID v4 `x-request-id` to requests that arrive without one
//! - Echo the id on the response
//! - Attach the id to the per-request tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Client-supplied ids are kept, not replaced

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that generates missing request ids.
pub fn set_request_id() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request id onto the response.
pub fn propagate_request_id() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Read the request id, or `"unknown"` if none is set.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for one inbound request, keyed by its id.
pub fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request.headers()),
        method = %request.method(),
        path = %request.uri().path(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id_lookup() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");

        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }
}
