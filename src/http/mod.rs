//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, trace, CORS, body limit, timeout)
//!     → middleware/token_gate.rs (gated routes: `token` header or 412)
//!     → middleware/redirect.rs (routes with a redirect: 307 after handling)
//!     → handlers.rs (run the route pipeline, answer 200 or 500)
//! ```

pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{GluttonServer, StartupError};
