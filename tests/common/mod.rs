//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use tokio::net::TcpListener;

use glutton::config::{Configuration, RouteSettings};
use glutton::pipeline::{Configurable, PayloadNotifier, PayloadParser, PayloadRecord, PipelineError};
use glutton::{ComponentRegistry, GluttonServer, Shutdown};

/// A route that writes `out_<n>` files into `output` and notifies nobody.
pub fn file_route(uri: &str, output: &Path) -> RouteSettings {
    RouteSettings {
        name: format!("{uri} test"),
        uri: uri.to_string(),
        notifier: "NilNotifier".to_string(),
        saver: "SimpleFileSystemSaver".to_string(),
        output_folder: output.display().to_string(),
        base_name: "out_%d".to_string(),
        ..RouteSettings::default()
    }
}

pub fn config(settings: Vec<RouteSettings>) -> Configuration {
    Configuration {
        settings,
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Configuration::default()
    }
}

/// Start a server on an ephemeral port. Triggering the returned handle stops it.
pub async fn start_server(config: Configuration, registry: &ComponentRegistry) -> (SocketAddr, Shutdown) {
    let server = GluttonServer::new(config, registry).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let stopped = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, stopped).await.unwrap();
    });

    (addr, shutdown)
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

/// A parser that always fails.
pub struct BrokenParser;

impl Configurable for BrokenParser {}

#[async_trait]
impl PayloadParser for BrokenParser {
    async fn parse(&self, _request: Request<Body>) -> Result<PayloadRecord, PipelineError> {
        Err(PipelineError::InvalidSetting {
            field: "parser",
            reason: "broken on purpose".to_string(),
        })
    }
}

/// A notifier that counts its calls through a shared counter.
pub struct CountingNotifier {
    pub calls: Arc<AtomicUsize>,
}

impl Configurable for CountingNotifier {}

#[async_trait]
impl PayloadNotifier for CountingNotifier {
    async fn notify(&self, _payload: Option<&PayloadRecord>) -> Result<(), PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Built-ins plus `BrokenParser` and `CountingNotifier` sharing `calls`.
pub fn test_registry(calls: Arc<AtomicUsize>) -> ComponentRegistry {
    let mut registry = ComponentRegistry::with_builtins();
    registry.register_parser("BrokenParser", || Box::new(BrokenParser));
    registry.register_notifier("CountingNotifier", move || {
        Box::new(CountingNotifier { calls: calls.clone() })
    });
    registry
}
