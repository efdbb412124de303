//! Metrics collection and exposition.
//!
//! # Metrics
//! - `glutton_requests_total` (counter): ingestion requests by route, status
//! - `glutton_stage_failures_total` (counter): failed pipeline stages by route, stage
//! - `glutton_tokens_issued_total` (counter): tokens minted by route
//! - `glutton_token_rejections_total` (counter): requests refused by the token gate
//!
//! # Design Decisions
//! - Labels are the route uri, never the raw request path
//! - The exporter is opt-in; recording without it costs nothing

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: &str, status: u16) {
    metrics::counter!(
        "glutton_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_stage_failure(route: &str, stage: &'static str) {
    metrics::counter!(
        "glutton_stage_failures_total",
        "route" => route.to_string(),
        "stage" => stage
    )
    .increment(1);
}

pub fn record_token_issued(route: &str) {
    metrics::counter!("glutton_tokens_issued_total", "route" => route.to_string()).increment(1);
}

pub fn record_token_rejected(route: &str) {
    metrics::counter!("glutton_token_rejections_total", "route" => route.to_string()).increment(1);
}
