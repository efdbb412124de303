//! Post-handling redirect.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Location clients are sent to once their payload was handled.
#[derive(Debug, Clone)]
pub struct RedirectTarget(pub Arc<str>);

impl RedirectTarget {
    pub fn new(location: &str) -> Self {
        Self(Arc::from(location))
    }
}

/// Runs the wrapped handler, then answers `307` whatever the handler returned.
pub async fn redirect_after(
    State(target): State<RedirectTarget>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    tracing::debug!(
        location = %target.0,
        status = %response.status(),
        "Redirecting after handling"
    );
    Redirect::temporary(&target.0).into_response()
}
