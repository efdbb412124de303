//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables
//!     → env.rs (field table: env var, yaml key, default, setter)
//!     → YAML file (loader.rs, keys present override the environment)
//!     → CLI debug flag (can only turn debug on)
//!     → no routes? one route from the environment
//!     → validation.rs (semantic checks)
//!     → Configuration (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{build_config, load_config, ConfigError};
pub use schema::{Configuration, RouteSettings};
