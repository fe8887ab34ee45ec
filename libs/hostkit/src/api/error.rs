//! Request-time failures and their default presentation.

use axum::response::{Html, IntoResponse, Response};
use http::StatusCode;

use crate::templates::TemplateError;

/// Failure details attached to a response's extensions.
///
/// Everything that renders the default error presentation attaches one, so that
/// the error negotiator can re-render the same failure for JSON clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub status: StatusCode,
    pub message: String,
}

/// Error type for route handlers.
///
/// Converts into the default presentation: an HTML error page at `status`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {message}")]
#[must_use]
pub struct HostError {
    pub status: StatusCode,
    pub message: String,
}

impl HostError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<TemplateError> for HostError {
    fn from(err: TemplateError) -> Self {
        tracing::error!(error = %err, "template rendering failed");
        Self::internal(err.to_string())
    }
}

impl From<anyhow::Error> for HostError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "internal error");
        Self::internal(format!("{err:#}"))
    }
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        let mut resp = (self.status, Html(render_error_page(self.status, &self.message)))
            .into_response();
        resp.extensions_mut().insert(Failure {
            status: self.status,
            message: self.message,
        });
        resp
    }
}

/// Default human-facing error page.
fn render_error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    let code = status.as_u16();
    let message = tera::escape_html(message);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{code} {title}</title>\n</head>\n<body>\n<h1>{code} {title}</h1>\n<p>{message}</p>\n</body>\n</html>\n"
    )
}
