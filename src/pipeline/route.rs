//! Per-route parse → notify → save composition.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use serde::{Deserialize, Serialize};

use crate::pipeline::{PayloadNotifier, PayloadParser, PayloadRecord, PayloadSaver, PipelineError};

/// What the pipeline does when a stage fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and run the remaining stages (best-effort ingestion).
    #[default]
    #[serde(alias = "Continue", alias = "CONTINUE")]
    Continue,
    /// Stop at the first failing stage.
    #[serde(alias = "Abort", alias = "ABORT")]
    Abort,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            other => Err(format!("expected continue or abort, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Notify,
    Save,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Notify => "notify",
            Stage::Save => "save",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: PipelineError,
}

/// Outcome of one pass through the pipeline.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Failures in stage order.
    pub failures: Vec<StageFailure>,
    /// True when the abort policy stopped the pipeline early.
    pub halted: bool,
}

impl PipelineReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, stage: Stage) -> bool {
        self.failures.iter().any(|f| f.stage == stage)
    }
}

/// The resolved stages of one configured route.
///
/// A stage configured with an empty component name is `None` and skipped.
#[derive(Clone)]
pub struct RoutePipeline {
    route: String,
    parser: Option<Arc<dyn PayloadParser>>,
    notifier: Option<Arc<dyn PayloadNotifier>>,
    saver: Option<Arc<dyn PayloadSaver>>,
    policy: FailurePolicy,
}

impl RoutePipeline {
    pub fn new(
        route: impl Into<String>,
        parser: Option<Arc<dyn PayloadParser>>,
        notifier: Option<Arc<dyn PayloadNotifier>>,
        saver: Option<Arc<dyn PayloadSaver>>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            route: route.into(),
            parser,
            notifier,
            saver,
            policy,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Run the request through all stages.
    pub async fn process(&self, request: Request<Body>) -> PipelineReport {
        let mut report = PipelineReport::default();

        let payload = match &self.parser {
            Some(parser) => match parser.parse(request).await {
                Ok(record) => Some(record),
                Err(error) => {
                    if self.record_failure(&mut report, Stage::Parse, error) {
                        return report;
                    }
                    None
                }
            },
            None => None,
        };

        if let Some(notifier) = &self.notifier {
            if let Err(error) = notifier.notify(payload.as_ref()).await {
                if self.record_failure(&mut report, Stage::Notify, error) {
                    return report;
                }
            }
        }

        if let Some(saver) = &self.saver {
            if let Err(error) = saver.save(payload.as_ref()).await {
                self.record_failure(&mut report, Stage::Save, error);
            }
        }

        report
    }

    /// Log and store a failure. Returns true if the pipeline must stop.
    fn record_failure(&self, report: &mut PipelineReport, stage: Stage, error: PipelineError) -> bool {
        tracing::warn!(
            route = %self.route,
            stage = %stage,
            error = %error,
            policy = ?self.policy,
            "Pipeline stage failed"
        );
        crate::observability::metrics::record_stage_failure(&self.route, stage.as_str());
        report.failures.push(StageFailure { stage, error });
        if self.policy == FailurePolicy::Abort {
            report.halted = true;
        }
        report.halted
    }
}
