//! Content-negotiated error responses.
//!
//! API clients that accept JSON get a minimal, parseable envelope:
//!
//! ```json
//! {"status":"error","message":"No route found for GET /missing"}
//! ```
//!
//! This covers failures the framework produces on its own (extractor
//! rejections, body limits) as well as [`HostError`](crate::api::HostError)s.
//! Everyone else gets the default presentation unchanged. The status code of
//! the failure is preserved either way; only the body and content type differ.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::error::Failure;

/// Substring of the `Accept` header that selects the structured outcome.
pub const STRUCTURED_FORMAT_MARKER: &str = "json";

/// Fixed status discriminator of the structured envelope.
pub const ERROR_STATUS: &str = "error";

/// Outcome of inspecting a request's `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptNegotiation {
    /// Client accepts JSON: render the structured envelope.
    Structured,
    /// Leave the default presentation untouched.
    Default,
}

impl AcceptNegotiation {
    #[must_use]
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(value) if value.contains(STRUCTURED_FORMAT_MARKER) => Self::Structured,
            _ => Self::Default,
        }
    }

    /// Inspect every `Accept` header value; non-UTF-8 values are ignored.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let structured = headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| Self::from_accept(Some(v)) == Self::Structured);
        if structured {
            Self::Structured
        } else {
            Self::Default
        }
    }
}

/// Structured error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: String,
    pub message: String,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            status: ERROR_STATUS.to_owned(),
            message: sanitize_message(message),
        }
    }
}

/// Strip double quotes so the message can be embedded in other structured text
/// without escaping.
#[must_use]
pub fn sanitize_message(message: &str) -> String {
    message.replace('"', "")
}

/// Render `failure` as the structured envelope at its own status code.
#[must_use]
pub fn structured_error_response(failure: &Failure) -> Response {
    let mut resp = (failure.status, Json(ErrorEnvelope::new(&failure.message))).into_response();
    resp.extensions_mut().insert(failure.clone());
    resp
}

/// Largest error body read back to recover a message for the envelope.
pub const MAX_ERROR_BODY_BYTES: usize = 8 * 1024;

/// Middleware that re-renders failures as JSON for clients that accept it.
///
/// Responses carrying a [`Failure`] extension ([`HostError`](crate::api::HostError),
/// the router fallbacks, the panic handler) are rendered from it. Any other
/// `4xx`/`5xx` response, such as an extractor rejection, is rendered from its
/// body text, or from the status's canonical reason when the body is empty or
/// larger than [`MAX_ERROR_BODY_BYTES`]. Successful responses pass through.
pub async fn negotiate_error_response(request: Request, next: Next) -> Response {
    let negotiation = AcceptNegotiation::from_headers(request.headers());

    let response = next.run(request).await;

    if negotiation == AcceptNegotiation::Default {
        return response;
    }

    if let Some(failure) = response.extensions().get::<Failure>() {
        tracing::debug!(
            status = failure.status.as_u16(),
            "rendering failure as structured error"
        );
        return structured_error_response(failure);
    }

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let message = failure_message(status, response.into_body()).await;
    tracing::debug!(
        status = status.as_u16(),
        "rendering framework failure as structured error"
    );
    structured_error_response(&Failure { status, message })
}

async fn failure_message(status: StatusCode, body: Body) -> String {
    let fallback = || status.canonical_reason().unwrap_or("Error").to_owned();
    match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let text = text.trim();
            if text.is_empty() {
                fallback()
            } else {
                text.to_owned()
            }
        }
        Err(_) => fallback(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn accept_marker_is_a_substring_match() {
        for accept in [
            "application/json",
            "application/problem+json",
            "text/html, application/json;q=0.9",
        ] {
            assert_eq!(
                AcceptNegotiation::from_accept(Some(accept)),
                AcceptNegotiation::Structured,
                "{accept}"
            );
        }
        for accept in [None, Some(""), Some("text/html"), Some("*/*")] {
            assert_eq!(AcceptNegotiation::from_accept(accept), AcceptNegotiation::Default);
        }
    }

    #[test]
    fn any_accept_header_value_counts() {
        let mut headers = HeaderMap::new();
        headers.append(header::ACCEPT, HeaderValue::from_static("text/html"));
        headers.append(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert_eq!(AcceptNegotiation::from_headers(&headers), AcceptNegotiation::Structured);
        assert_eq!(
            AcceptNegotiation::from_headers(&HeaderMap::new()),
            AcceptNegotiation::Default
        );
    }

    #[test]
    fn envelope_wire_format() {
        let body = serde_json::to_string(&ErrorEnvelope::new("Not \"found\"")).unwrap();
        assert_eq!(body, r#"{"status":"error","message":"Not found"}"#);
    }

    #[test]
    fn structured_response_keeps_status() {
        let failure = Failure {
            status: StatusCode::CONFLICT,
            message: "taken".to_owned(),
        };
        let resp = structured_error_response(&failure);
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn framework_failure_message_comes_from_body() {
        let msg = failure_message(StatusCode::BAD_REQUEST, Body::from("  Invalid URL\n")).await;
        assert_eq!(msg, "Invalid URL");
    }

    #[tokio::test]
    async fn empty_or_oversized_body_falls_back_to_reason() {
        let msg = failure_message(StatusCode::PAYLOAD_TOO_LARGE, Body::empty()).await;
        assert_eq!(msg, "Payload Too Large");

        let huge = "x".repeat(MAX_ERROR_BODY_BYTES + 1);
        let msg = failure_message(StatusCode::BAD_REQUEST, Body::from(huge)).await;
        assert_eq!(msg, "Bad Request");
    }
}
