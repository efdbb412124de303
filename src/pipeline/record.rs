//! Parsed representation of a single inbound request.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Header name → values in the order they were received.
pub type Meta = BTreeMap<String, Vec<String>>;

/// Payload of one request, created by a parser and read by notifiers and savers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRecord {
    /// Request body as text.
    pub payload: String,
    /// When the payload was parsed (not when the request arrived).
    pub timestamp: DateTime<Utc>,
    /// Request headers.
    pub meta: Meta,
    /// Peer address if known. Behind a proxy this is the proxy's address.
    pub remote: String,
}

impl PayloadRecord {
    pub fn new(payload: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            timestamp: Utc::now(),
            meta: Meta::new(),
            remote: remote.into(),
        }
    }

    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        self.meta = meta_from_headers(headers);
        self
    }
}

/// Group header values by name. Values that are not visible ASCII are replaced lossily.
pub fn meta_from_headers(headers: &HeaderMap) -> Meta {
    let mut meta = Meta::new();
    for (name, value) in headers {
        meta.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    meta
}

impl fmt::Display for PayloadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}\n\n{}\n\n", self.timestamp, self.remote, self.payload)?;
        write!(f, "map[")?;
        for (i, (name, values)) in self.meta.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}:[{}]", name, values.join(" "))?;
        }
        writeln!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_meta_groups_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let meta = meta_from_headers(&headers);
        assert_eq!(meta["accept"], vec!["text/plain", "application/json"]);
        assert_eq!(meta["content-type"], vec!["text/plain"]);
    }

    #[test]
    fn test_display_contains_payload_and_meta() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let record = PayloadRecord::new("hello", "127.0.0.1:5000").with_headers(&headers);

        let rendered = record.to_string();
        assert!(rendered.contains(":127.0.0.1:5000\n\nhello\n\n"));
        assert!(rendered.ends_with("map[content-type:[text/plain]]\n"));
    }
}
