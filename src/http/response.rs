//! Response artifact handed to the HTTP boundary.
//!
//! # Responsibilities
//! - Carry status, content type and body for exactly one response
//! - Provide the fixed responses of the bridge surface
//! - Convert into an axum `Response`
//!
//! # Design Decisions
//! - Handlers return one `HttpOutcome` by value; axum writes it once
//! - Serialization failures degrade to the generic `Problem` reply

use std::any::Any;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Status, content type and body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOutcome {
    status: StatusCode,
    content_type: &'static str,
    body: Bytes,
}

impl HttpOutcome {
    /// Plain-text response.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            body: Bytes::from(body.into()),
        }
    }

    /// JSON response; falls back to [`HttpOutcome::problem`] if `value` cannot be encoded.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: APPLICATION_JSON,
                body: Bytes::from(body),
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode JSON response");
                Self::problem()
            }
        }
    }

    /// `404 Not found` for anything outside the bridge routes.
    pub fn not_found() -> Self {
        Self::text(StatusCode::NOT_FOUND, "Not found")
    }

    /// `200 pub`, the publish acknowledgment.
    pub fn published() -> Self {
        Self::text(StatusCode::OK, "pub")
    }

    /// `400 Bad Request: <detail>`.
    pub fn bad_request(detail: impl std::fmt::Display) -> Self {
        Self::text(StatusCode::BAD_REQUEST, format!("Bad Request: {}", detail))
    }

    /// `200 No procedure set`, for call requests that never reach the session.
    pub fn no_procedure() -> Self {
        Self::text(StatusCode::OK, "No procedure set")
    }

    /// `200 Problem`, for faults while waiting on a call.
    pub fn problem() -> Self {
        Self::text(StatusCode::OK, "Problem")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Text carried by a panic payload, if it is a string.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "panic"
    }
}

impl IntoResponse for HttpOutcome {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_responses() {
        assert_eq!(HttpOutcome::not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(HttpOutcome::not_found().body(), b"Not found");
        assert_eq!(HttpOutcome::published().body(), b"pub");
        assert_eq!(HttpOutcome::no_procedure().status(), StatusCode::OK);
        assert_eq!(HttpOutcome::problem().body(), b"Problem");
    }

    #[test]
    fn test_panic_message() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let formatted: Box<dyn Any + Send> = Box::new(format!("boom {}", 2));
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(literal.as_ref()), "boom");
        assert_eq!(panic_message(formatted.as_ref()), "boom 2");
        assert_eq!(panic_message(other.as_ref()), "panic");
    }

    #[test]
    fn test_bad_request_prefix() {
        let outcome = HttpOutcome::bad_request("Invalid URI: a.*");
        assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
        assert_eq!(outcome.content_type(), TEXT_PLAIN);
        assert_eq!(outcome.body(), b"Bad Request: Invalid URI: a.*");
    }

    #[tokio::test]
    async fn test_into_response_sets_headers() {
        let response =
            HttpOutcome::json(StatusCode::OK, &serde_json::json!({"a": 1})).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            APPLICATION_JSON
        );
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"a":1}"#);
    }
}
