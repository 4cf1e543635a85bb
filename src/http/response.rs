//! Response rendering.
//!
//! # Responsibilities
//! - Turn an invocation reply into an HTTP response
//! - Label every payload as JSON
//!
//! # Design Decisions
//! - The payload is already serialized; it is sent byte-for-byte
//! - An out-of-range status falls back to 500

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::fanout::InvocationResponse;

impl IntoResponse for InvocationResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            self.payload,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_and_content_type() {
        let response = InvocationResponse {
            status: 400,
            payload: r#""No array is passed in. Was given: 1""#.to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#""No array is passed in. Was given: 1""#);
    }
}
