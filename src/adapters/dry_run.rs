use std::sync::Mutex;

use crate::domain::{AppError, Invocation};
use crate::ports::WorkflowRunner;

/// Runner that only records what it was asked to dispatch.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    recorded: Mutex<Vec<(Invocation, String)>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded invocations with their refs, in completion order.
    pub fn recorded(&self) -> Vec<(Invocation, String)> {
        self.recorded.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl WorkflowRunner for DryRunRunner {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn dispatch(&self, invocation: &Invocation, git_ref: &str) -> Result<(), AppError> {
        tracing::info!(
            invocation = %invocation.display_name(),
            workflow = %invocation.workflow,
            git_ref,
            "dry run: not dispatching"
        );
        let mut recorded = self
            .recorded
            .lock()
            .map_err(|_| AppError::config_error("dry-run recorder lock poisoned"))?;
        recorded.push((invocation.clone(), git_ref.to_string()));
        Ok(())
    }
}
