//! Structured per-stage diagnostics
//!
//! Every pipeline stage records counts in/out and a short detail string.
//! The events ride along in the report metadata for the observability
//! collaborator and are mirrored as `tracing` events; they are not part of
//! the functional contract.

use serde::{Deserialize, Serialize};

/// One stage transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: String,
    pub findings_in: usize,
    pub findings_out: usize,
    pub detail: String,
}

/// Collects stage events over one invocation.
#[derive(Debug, Default)]
pub struct StageTrace {
    events: Vec<StageEvent>,
}

impl StageTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage transition and mirror it to tracing.
    pub fn record(
        &mut self,
        stage: &str,
        findings_in: usize,
        findings_out: usize,
        detail: impl Into<String>,
    ) {
        let detail = detail.into();
        tracing::info!(stage, findings_in, findings_out, detail = %detail, "pipeline stage");
        self.events.push(StageEvent {
            stage: stage.to_string(),
            findings_in,
            findings_out,
            detail,
        });
    }

    pub fn into_events(self) -> Vec<StageEvent> {
        self.events
    }
}
