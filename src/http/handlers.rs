//! Route handlers: payload ingestion and token issuance.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::http::middleware::TokenGate;
use crate::observability::metrics;
use crate::pipeline::RoutePipeline;

/// Error body of `500` answers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Pipeline stage that failed, absent for token issuance failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// `POST /v1/glutton/<uri>`: run the route pipeline.
///
/// Answers `200` unless the abort policy stopped the pipeline.
pub async fn ingest(
    State(pipeline): State<Arc<RoutePipeline>>,
    request: Request<Body>,
) -> Response {
    let report = pipeline.process(request).await;

    let response = match report.failures.last() {
        Some(failure) if report.halted => ErrorResponse {
            error: failure.error.to_string(),
            stage: Some(failure.stage.as_str()),
        }
        .into_response(),
        _ => StatusCode::OK.into_response(),
    };

    tracing::debug!(
        route = %pipeline.route(),
        failures = report.failures.len(),
        status = %response.status(),
        "Payload handled"
    );
    metrics::record_request(pipeline.route(), response.status().as_u16());
    response
}

/// `GET /v1/glutton/<uri>/token`: mint a token for the route.
pub async fn issue_token(State(gate): State<Arc<TokenGate>>) -> Response {
    match gate.provider().generate_token(gate.route(), Utc::now()) {
        Ok(token) => {
            metrics::record_token_issued(gate.route());
            token.into_response()
        }
        Err(e) => {
            tracing::error!(route = %gate.route(), error = %e, "Failed to generate token");
            ErrorResponse {
                error: e.to_string(),
                stage: None,
            }
            .into_response()
        }
    }
}
