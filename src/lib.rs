//! Glutton: a configurable HTTP ingestion endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──POST /v1/glutton/<uri>──▶ http::server
//!                                           │
//!                       token gate (auth) ◀─┤ gated routes only
//!                                           │
//!                                           ▼
//!                                   pipeline::RoutePipeline
//!                              parse ──▶ notify ──▶ save
//!                                │          │         │
//!                                └──── components ────┘
//!                               (resolved by registry)
//!
//!     Client ──GET /v1/glutton/<uri>/token──▶ auth::TokenProvider
//! ```
//!
//! Cross-cutting: `config` (env + YAML), `observability` (logging, metrics),
//! `lifecycle` (signals, shutdown).

// Core subsystems
pub mod auth;
pub mod config;
pub mod http;
pub mod pipeline;
pub mod registry;

// Pluggable stages
pub mod components;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{load_config, Configuration, RouteSettings};
pub use http::{GluttonServer, StartupError};
pub use lifecycle::Shutdown;
pub use registry::ComponentRegistry;
