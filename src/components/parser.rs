use std::net::SocketAddr;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;

use crate::config::RouteSettings;
use crate::pipeline::{Configurable, PayloadParser, PayloadRecord, PipelineError};

/// Reads the whole body as text and keeps the headers and peer address.
#[derive(Debug, Default)]
pub struct SimpleParser {
    debug: bool,
}

impl SimpleParser {
    pub const NAME: &'static str = "SimpleParser";
}

impl Configurable for SimpleParser {
    fn configure(&mut self, settings: &RouteSettings) -> Result<(), PipelineError> {
        self.debug = settings.debug;
        Ok(())
    }
}

#[async_trait]
impl PayloadParser for SimpleParser {
    async fn parse(&self, request: Request<Body>) -> Result<PayloadRecord, PipelineError> {
        let (parts, body) = request.into_parts();
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_default();

        // The body limit layer bounds what reaches this point.
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(PipelineError::Body)?;

        let record = PayloadRecord::new(String::from_utf8_lossy(&bytes), remote)
            .with_headers(&parts.headers);
        if self.debug {
            tracing::debug!(remote = %record.remote, bytes = bytes.len(), "Parsed payload");
        }
        Ok(record)
    }
}
