//! Capability traits implemented by pluggable pipeline stages.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use thiserror::Error;

use crate::config::RouteSettings;
use crate::pipeline::PayloadRecord;

/// Errors raised by parsers, notifiers and savers.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request body could not be read.
    #[error("error reading payload: {0}")]
    Body(#[source] axum::Error),

    /// A previous stage produced no payload.
    #[error("no payload to process")]
    MissingPayload,

    /// A setting required by the component is missing or invalid.
    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error sending notification: {0}")]
    Smtp(String),

    #[error("error saving payload: {0}")]
    Database(#[from] sqlx::Error),
}

/// Anything that can be configured from a route's settings.
///
/// Called exactly once, right after construction by the registry.
pub trait Configurable {
    fn configure(&mut self, _settings: &RouteSettings) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Turns an HTTP request into a [`PayloadRecord`].
#[async_trait]
pub trait PayloadParser: Configurable + Send + Sync {
    async fn parse(&self, request: Request<Body>) -> Result<PayloadRecord, PipelineError>;
}

/// Announces a received payload (mail, chat, ...).
#[async_trait]
pub trait PayloadNotifier: Configurable + Send + Sync {
    async fn notify(&self, payload: Option<&PayloadRecord>) -> Result<(), PipelineError>;
}

/// Persists a received payload.
#[async_trait]
pub trait PayloadSaver: Configurable + Send + Sync {
    async fn save(&self, payload: Option<&PayloadRecord>) -> Result<(), PipelineError>;
}
