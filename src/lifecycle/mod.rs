//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → server stops accepting and exits
//! ```
//!
//! # Design Decisions
//! - Startup order lives in main: config, logging, registry, metrics, listener
//! - Shutdown is immediate: in-flight requests are not drained

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
