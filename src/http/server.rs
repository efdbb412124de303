//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Resolve each route's components through the registry
//! - Mount one ingestion endpoint per route, plus a token endpoint for gated routes
//! - Wire up middleware (request ID, tracing, CORS, body limit, timeout)
//! - Serve until the shutdown signal fires

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    middleware,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::DefaultTokenProvider;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, Configuration, RouteSettings};
use crate::http::handlers;
use crate::http::middleware::{redirect_after, token_gate, RedirectTarget, TokenGate};
use crate::pipeline::RoutePipeline;
use crate::registry::{ComponentRegistry, RegistryError};

/// Anything that stops the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route {uri:?}: {source}")]
    Registry {
        uri: String,
        #[source]
        source: RegistryError,
    },

    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The ingestion server.
pub struct GluttonServer {
    router: Router,
    config: Configuration,
}

impl GluttonServer {
    /// Build the router for every configured route.
    ///
    /// Fails if the configuration is invalid, a component name does not resolve
    /// or a component rejects its settings.
    pub fn new(config: Configuration, registry: &ComponentRegistry) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let mut router = Router::new();

        for route in &config.settings {
            router = mount_route(router, route, registry, config.debug)?;
        }

        let router = Self::apply_layers(router, &config);
        Ok(Self { router, config })
    }

    #[allow(deprecated)]
    fn apply_layers(router: Router, config: &Configuration) -> Router {
        router
            .layer(TimeoutLayer::new(config.request_timeout()))
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(cors_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Stopping is immediate: the accept loop is dropped and in-flight
    /// requests are not waited for.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.settings.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        tokio::select! {
            result = axum::serve(listener, app).into_future() => result?,
            _ = shutdown.recv() => tracing::info!("Shutdown signal received"),
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::HEAD, Method::PATCH])
        .allow_headers([header::ORIGIN, header::CONTENT_LENGTH, header::CONTENT_TYPE])
}

/// Resolve the route's stages and mount its endpoints.
fn mount_route(
    router: Router,
    route: &RouteSettings,
    registry: &ComponentRegistry,
    debug: bool,
) -> Result<Router, StartupError> {
    let uri = route.uri.trim_matches('/').to_string();
    let registry_error = |source| StartupError::Registry { uri: uri.clone(), source };

    // An empty name leaves the stage out.
    let parser = match route.parser.as_str() {
        "" => None,
        name => Some(registry.create_parser(name, route).map_err(registry_error)?),
    };
    let notifier = match route.notifier.as_str() {
        "" => None,
        name => Some(registry.create_notifier(name, route).map_err(registry_error)?),
    };
    let saver = match route.saver.as_str() {
        "" => None,
        name => Some(registry.create_saver(name, route).map_err(registry_error)?),
    };

    let pipeline = Arc::new(RoutePipeline::new(
        uri.clone(),
        parser,
        notifier,
        saver,
        route.on_stage_error,
    ));

    let mut ingest = post(handlers::ingest).with_state(pipeline);
    if let Some(location) = route.redirect.as_deref().filter(|l| !l.is_empty()) {
        ingest = ingest.layer(middleware::from_fn_with_state(
            RedirectTarget::new(location),
            redirect_after,
        ));
    }

    let mut router = router;
    if route.use_token {
        let provider = DefaultTokenProvider::new(
            route.token_max_age(),
            route.token_key.as_bytes().to_vec(),
            route.debug || debug,
        );
        let gate = Arc::new(TokenGate::new(uri.clone(), Arc::new(provider)));
        ingest = ingest.layer(middleware::from_fn_with_state(gate.clone(), token_gate));
        router = router.route(&route.token_path(), get(handlers::issue_token).with_state(gate));
    }

    tracing::info!(
        path = %route.path(),
        name = %route.name,
        parser = %route.parser,
        notifier = %route.notifier,
        saver = %route.saver,
        use_token = route.use_token,
        redirect = ?route.redirect,
        policy = ?route.on_stage_error,
        "Route mounted"
    );

    Ok(router.route(&route.path(), ingest))
}
