//! Ingestion pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! POST /v1/glutton/<uri>
//!     → PayloadParser::parse (request → PayloadRecord)
//!     → PayloadNotifier::notify (mail, nothing, ...)
//!     → PayloadSaver::save (filesystem, database, ...)
//!     → PipelineReport (failures per stage)
//! ```
//!
//! # Design Decisions
//! - Stages are trait objects resolved by name through the registry
//! - A failed stage is logged; with `FailurePolicy::Continue` the next stage still runs
//!   with whatever payload exists (possibly none)
//! - One pipeline instance per route, shared by all of that route's requests

pub mod record;
pub mod route;
pub mod stages;

pub use record::{meta_from_headers, Meta, PayloadRecord};
pub use route::{FailurePolicy, PipelineReport, RoutePipeline, Stage, StageFailure};
pub use stages::{Configurable, PayloadNotifier, PayloadParser, PayloadSaver, PipelineError};
