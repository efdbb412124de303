//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Detect conflicting routes
//! - Validate value ranges (timeouts > 0, key lengths)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Configuration → Result<(), Vec<ValidationError>>
//! - Component names are resolved later, against the registry

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::auth::codec::is_valid_key_length;
use crate::config::schema::Configuration;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route {route:?} has an empty uri")]
    EmptyUri { route: String },

    #[error("uri {uri:?} must not contain braces or segments starting with ':' or '*'")]
    InvalidUri { uri: String },

    #[error("uri {uri:?} is configured more than once")]
    DuplicateUri { uri: String },

    #[error("route {uri:?} token key must be 16, 24 or 32 bytes, got {len}")]
    InvalidTokenKey { uri: String, len: usize },

    #[error("route {uri:?} token max age must be greater than zero")]
    ZeroTokenMaxAge { uri: String },

    #[error("uri {uri:?} collides with the token endpoint of a gated route")]
    TokenPathConflict { uri: String },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("max body size must be greater than zero")]
    ZeroBodyLimit,

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// True if the router would mount `uri` as a literal path, with no captures or wildcards.
fn is_literal_path(uri: &str) -> bool {
    !uri.contains(['{', '}'])
        && uri.split('/').all(|segment| !segment.starts_with(':') && !segment.starts_with('*'))
}

pub fn validate_config(config: &Configuration) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for route in &config.settings {
        let uri = route.uri.trim_matches('/');
        if uri.is_empty() {
            errors.push(ValidationError::EmptyUri { route: route.name.clone() });
            continue;
        }
        if !is_literal_path(uri) {
            errors.push(ValidationError::InvalidUri { uri: uri.to_string() });
            continue;
        }
        if !seen.insert(uri.to_string()) {
            errors.push(ValidationError::DuplicateUri { uri: uri.to_string() });
        }
        if route.use_token {
            let len = route.token_key.len();
            if len != 0 && !is_valid_key_length(len) {
                errors.push(ValidationError::InvalidTokenKey { uri: uri.to_string(), len });
            }
            if route.token_max_age_secs == 0 {
                errors.push(ValidationError::ZeroTokenMaxAge { uri: uri.to_string() });
            }
        }
    }

    for route in config.settings.iter().filter(|r| r.use_token) {
        let token_uri = format!("{}/token", route.uri.trim_matches('/'));
        if seen.contains(&token_uri) {
            errors.push(ValidationError::TokenPathConflict { uri: token_uri });
        }
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.metrics_enabled && config.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(config.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
