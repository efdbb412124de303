//! Time-limited route tokens.
//!
//! # Responsibilities
//! - Build the plaintext `"<route>::<unix-seconds>"` and encrypt it
//! - Validate route binding and the freshness window on inbound requests
//!
//! # Design Decisions
//! - Two-sided window: `issued + max_age > now` and `issued <= now + 1s`
//! - An empty key falls back to [`DEFAULT_TOKEN_KEY`]

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use super::codec;
use super::TokenError;

/// Key used when a route enables tokens without configuring a key.
pub const DEFAULT_TOKEN_KEY: &str = "default-key-change-it-please-now";

/// Default token lifetime.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

const SEPARATOR: &str = "::";
const CLOCK_SKEW_SECS: i64 = 1;

/// Reasons a presented token is not accepted.
#[derive(Debug, Error)]
pub enum TokenRejection {
    #[error("token could not be decrypted: {0}")]
    Undecodable(#[from] TokenError),

    #[error("token plaintext is malformed")]
    Malformed,

    #[error("token bound to route {actual:?}, expected {expected:?}")]
    RouteMismatch { expected: String, actual: String },

    #[error("token issued at {issued} expired (max age {max_age:?})")]
    Expired { issued: DateTime<Utc>, max_age: Duration },

    #[error("token issued at {issued} is in the future")]
    IssuedInFuture { issued: DateTime<Utc> },
}

/// Anything that can issue and check tokens bound to a route and a point in time.
pub trait TokenProvider: Send + Sync {
    /// Issue a token for `route` at `now`.
    fn generate_token(&self, route: &str, now: DateTime<Utc>) -> Result<String, TokenError>;

    /// Check a token, returning the reason when it is not accepted.
    fn verify_token(&self, token: &str, route: &str, now: DateTime<Utc>) -> Result<(), TokenRejection>;

    /// Fail-closed boolean form of [`TokenProvider::verify_token`].
    fn validate_token(&self, token: &str, route: &str, now: DateTime<Utc>) -> bool {
        match self.verify_token(token, route, now) {
            Ok(()) => true,
            Err(rejection) => {
                tracing::debug!(route = %route, reason = %rejection, "Token rejected");
                false
            }
        }
    }
}

/// AES-CFB backed [`TokenProvider`].
#[derive(Clone)]
pub struct DefaultTokenProvider {
    max_age: Duration,
    key: Vec<u8>,
    debug: bool,
}

impl DefaultTokenProvider {
    /// Create a provider. An empty `key` is replaced by [`DEFAULT_TOKEN_KEY`].
    pub fn new(max_age: Duration, key: impl Into<Vec<u8>>, debug: bool) -> Self {
        let mut key = key.into();
        if key.is_empty() {
            tracing::warn!("Token key not configured, falling back to the built-in default key");
            key = DEFAULT_TOKEN_KEY.as_bytes().to_vec();
        }
        Self { max_age, key, debug }
    }
}

impl std::fmt::Debug for DefaultTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultTokenProvider")
            .field("max_age", &self.max_age)
            .field("key", &"<redacted>")
            .field("debug", &self.debug)
            .finish()
    }
}

impl TokenProvider for DefaultTokenProvider {
    fn generate_token(&self, route: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let plain = format!("{route}{SEPARATOR}{}", now.timestamp());
        if self.debug {
            tracing::debug!(token = %plain, "Generating token");
        }
        codec::encrypt(&self.key, &plain)
    }

    fn verify_token(&self, token: &str, route: &str, now: DateTime<Utc>) -> Result<(), TokenRejection> {
        let plain = codec::decrypt(&self.key, token)?;

        let parts: Vec<&str> = plain.split(SEPARATOR).collect();
        let [token_route, unix] = parts.as_slice() else {
            return Err(TokenRejection::Malformed);
        };

        if *token_route != route {
            return Err(TokenRejection::RouteMismatch {
                expected: route.to_string(),
                actual: token_route.to_string(),
            });
        }

        let issued = unix
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(TokenRejection::Malformed)?;

        let max_age = TimeDelta::from_std(self.max_age).unwrap_or(TimeDelta::MAX);
        let not_expired = issued
            .checked_add_signed(max_age)
            .map_or(true, |deadline| deadline > now);
        if !not_expired {
            return Err(TokenRejection::Expired { issued, max_age: self.max_age });
        }

        if issued > now + TimeDelta::seconds(CLOCK_SKEW_SECS) {
            return Err(TokenRejection::IssuedInFuture { issued });
        }

        if self.debug {
            tracing::debug!(token = %plain, "Token is valid");
        }
        Ok(())
    }
}
