use serde::Serialize;

use crate::domain::dispatcher::SuppressReason;
use crate::domain::invocation::Invocation;

/// Result of handing one invocation to the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    Dispatched,
    Failed { reason: String },
    Cancelled,
}

impl InvocationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            InvocationOutcome::Dispatched => "dispatched",
            InvocationOutcome::Failed { .. } => "failed",
            InvocationOutcome::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvocationReport {
    pub invocation: Invocation,
    #[serde(flatten)]
    pub outcome: InvocationOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    Failed,
    Suppressed,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::Suppressed => "suppressed",
        }
    }
}

/// Outcome of a dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub dispatcher: Option<String>,
    pub plan_digest: String,
    pub git_ref: String,
    pub runner: String,
    pub started_at: String,
    pub finished_at: String,
    pub suppressed: Option<SuppressReason>,
    pub invocations: Vec<InvocationReport>,
    pub status: RunStatus,
}

impl RunReport {
    /// The run fails if any invocation failed or never started.
    pub fn status_for(suppressed: bool, invocations: &[InvocationReport]) -> RunStatus {
        if suppressed {
            return RunStatus::Suppressed;
        }
        if invocations.iter().all(|r| r.outcome == InvocationOutcome::Dispatched) {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.invocations.iter().filter(|r| r.outcome.label() == label).count()
    }

    pub fn is_success(&self) -> bool {
        self.status != RunStatus::Failed
    }
}
