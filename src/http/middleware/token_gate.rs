//! Token validation gate.
//! Refuses requests whose `token` header does not validate for the route.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::auth::TokenProvider;
use crate::observability::metrics;

pub const TOKEN_HEADER: &str = "token";

/// Token state of one gated route. Shared by the gate and the token endpoint.
#[derive(Clone)]
pub struct TokenGate {
    route: String,
    provider: Arc<dyn TokenProvider>,
}

impl TokenGate {
    pub fn new(route: impl Into<String>, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            route: route.into(),
            provider,
        }
    }

    /// Route identity the tokens are bound to.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn provider(&self) -> &dyn TokenProvider {
        self.provider.as_ref()
    }
}

pub async fn token_gate(
    State(gate): State<Arc<TokenGate>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !gate.provider.validate_token(token, &gate.route, Utc::now()) {
        tracing::info!(route = %gate.route, "Request refused, invalid token");
        metrics::record_token_rejected(&gate.route);
        return StatusCode::PRECONDITION_FAILED.into_response();
    }

    next.run(req).await
}
