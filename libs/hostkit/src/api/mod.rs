//! HTTP-facing failure handling.
//!
//! [`install_error_handling`] wraps a finished router so that every failure it
//! can produce (handler errors, unmatched routes, disallowed methods, panics)
//! goes through the same default presentation and, for JSON clients, through
//! [`negotiate_error_response`].

pub mod error;
pub mod negotiate;

use std::any::Any;

use axum::{
    Router,
    http::{Method, Uri},
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub use error::{Failure, HostError};
pub use negotiate::{
    AcceptNegotiation, ErrorEnvelope, negotiate_error_response, sanitize_message,
    structured_error_response,
};

/// Wrap `router` with fallbacks, panic recovery, error negotiation and request tracing.
///
/// The negotiator sits outside panic recovery so it also sees recovered panics.
/// With `expose_panics` the panic payload becomes the failure message; otherwise
/// clients only see the canonical status text.
pub fn install_error_handling(router: Router, expose_panics: bool) -> Router {
    router
        .fallback(no_route)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(
            move |payload: Box<dyn Any + Send + 'static>| panic_response(&*payload, expose_panics),
        ))
        .layer(axum::middleware::from_fn(negotiate_error_response))
        .layer(TraceLayer::new_for_http())
}

async fn no_route(method: Method, uri: Uri) -> HostError {
    HostError::not_found(format!("No route found for \"{method} {}\"", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> HostError {
    HostError::new(
        axum::http::StatusCode::METHOD_NOT_ALLOWED,
        format!(
            "No route found for \"{method} {}\": Method Not Allowed",
            uri.path()
        ),
    )
}

/// Text of a panic payload, when it is a string.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
}

fn panic_response(payload: &(dyn Any + Send), expose: bool) -> Response {
    let detail = panic_message(payload);

    tracing::error!(panic = detail.unwrap_or("<non-string payload>"), "handler panicked");

    let message = match detail {
        Some(text) if expose => text.to_owned(),
        _ => "Internal Server Error".to_owned(),
    };
    HostError::internal(message).into_response()
}
